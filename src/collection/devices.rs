//! The fixed GPU device registry.

use crate::service::DeviceInfo;

/// The logical GPU devices this reporter covers. There is exactly one, the
/// GCNano core, and the list never changes at runtime.
pub(crate) static GPU_DEVICES: &[DeviceInfo] = &[DeviceInfo {
    id: 0,
    name: "gcnano",
}];
