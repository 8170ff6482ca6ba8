mod chain;
mod guid;
mod inspect;
mod media;
mod transform;

pub use chain::cmd_chain;
pub use guid::cmd_guid;
pub use inspect::cmd_inspect;
pub use media::cmd_media;
pub use transform::cmd_transform;

use msibind_lib::binder::BindError;

use crate::output::print_diagnostic;

/// Print the collected errors of a failed bind before handing it to anyhow.
fn report(err: BindError) -> anyhow::Error {
  if let BindError::AuthoringFailed { errors } = &err {
    for diagnostic in errors {
      print_diagnostic(diagnostic);
    }
  }
  err.into()
}
