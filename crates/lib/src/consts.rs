use uuid::Uuid;

/// Namespace for component GUIDs generated from canonical key paths.
pub const COMPONENT_GUID_NAMESPACE: Uuid = Uuid::from_u128(0x3064e5c6_fb63_4fe9_ac49_e446a792efa5);

/// Value of `Component.ComponentId` that requests a generated GUID.
pub const GENERATE_GUID: &str = "*";

/// Environment variable overriding the maximum uncompressed media size (MB).
pub const MEDIA_SIZE_OVERRIDE_VAR: &str = "MSIBIND_MUMS";

/// Default maximum uncompressed media size (MB) when a template leaves it unset.
pub const DEFAULT_MAX_UNCOMPRESSED_MEDIA_SIZE_MB: i64 = 200;

/// Highest cabinet index the automatic assigner will open.
pub const MAX_CABINET_INDEX: u32 = 999;

pub const DEFAULT_CABINET_TEMPLATE: &str = "cab{0}.cab";

pub const MERGE_MODULE_CABINET: &str = "MergeModule.CABinet";

/// File name of the zero-length placeholder used for binary sentinels.
pub const EMPTY_FILE_NAME: &str = "empty";

pub const DEFAULT_ROLLBACK_BOUNDARY_ID: &str = "DefaultRollbackBoundary";
