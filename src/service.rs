//! The memtrack service surface: typed memory accounting records and the
//! query entry points callers go through.

use std::{path::PathBuf, str::FromStr};

use bitflags::bitflags;

use crate::{
    collection::{devices, vidmem, Pid},
    utils::error::{MemtrackError, Result},
};

bitflags! {
    /// Accounting attributes of a [`MemtrackRecord`].
    ///
    /// Bit positions follow the platform memtrack ABI.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemtrackFlags: u32 {
        /// Visible through standard per-process smaps accounting.
        const SMAPS_ACCOUNTED = 1 << 1;
        /// Not visible through standard per-process smaps accounting.
        const SMAPS_UNACCOUNTED = 1 << 2;
        /// Shared with other processes.
        const SHARED = 1 << 3;
        /// Shared with other processes, proportionally attributed.
        const SHARED_PSS = 1 << 4;
        /// Not shared with other processes.
        const PRIVATE = 1 << 5;
        /// Backed by system RAM.
        const SYSTEM = 1 << 6;
        /// Backed by dedicated device memory.
        const DEDICATED = 1 << 7;
        /// Outside any protected memory region.
        const NONSECURE = 1 << 8;
        /// Inside a protected memory region.
        const SECURE = 1 << 9;
    }
}

/// One memory accounting entry attributed to a queried process. Built fresh
/// per query and handed to the caller by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemtrackRecord {
    /// Committed bytes.
    pub size_in_bytes: u64,
    /// Accounting attributes of those bytes.
    pub flags: MemtrackFlags,
}

/// The memory categories a caller can query. Only [`MemtrackType::Graphics`]
/// is actually tracked on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MemtrackType {
    Other = 0,
    Gl = 1,
    Graphics = 2,
    Multimedia = 3,
    Camera = 4,
}

impl MemtrackType {
    /// Every supported memory type.
    pub const ALL: [MemtrackType; 5] = [
        MemtrackType::Other,
        MemtrackType::Gl,
        MemtrackType::Graphics,
        MemtrackType::Multimedia,
        MemtrackType::Camera,
    ];
}

impl TryFrom<i32> for MemtrackType {
    type Error = MemtrackError;

    fn try_from(raw: i32) -> Result<Self> {
        let mem_type = match raw {
            0 => MemtrackType::Other,
            1 => MemtrackType::Gl,
            2 => MemtrackType::Graphics,
            3 => MemtrackType::Multimedia,
            4 => MemtrackType::Camera,
            _ => {
                return Err(MemtrackError::UnsupportedOperation(format!(
                    "memory type '{raw}' is outside the supported set"
                )));
            }
        };

        Ok(mem_type)
    }
}

impl FromStr for MemtrackType {
    type Err = MemtrackError;

    fn from_str(s: &str) -> Result<Self> {
        // Callers pass raw wire values around too, so accept those as well.
        if let Ok(raw) = s.parse::<i32>() {
            return MemtrackType::try_from(raw);
        }

        let mem_type = if s.eq_ignore_ascii_case("other") {
            MemtrackType::Other
        } else if s.eq_ignore_ascii_case("gl") {
            MemtrackType::Gl
        } else if s.eq_ignore_ascii_case("graphics") {
            MemtrackType::Graphics
        } else if s.eq_ignore_ascii_case("multimedia") {
            MemtrackType::Multimedia
        } else if s.eq_ignore_ascii_case("camera") {
            MemtrackType::Camera
        } else {
            return Err(MemtrackError::UnsupportedOperation(format!(
                "'{s}' is not a supported memory type"
            )));
        };

        Ok(mem_type)
    }
}

impl std::fmt::Display for MemtrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MemtrackType::Other => "other",
            MemtrackType::Gl => "gl",
            MemtrackType::Graphics => "graphics",
            MemtrackType::Multimedia => "multimedia",
            MemtrackType::Camera => "camera",
        })
    }
}

/// A logical GPU device covered by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device identifier.
    pub id: i32,
    /// Human-readable device name.
    pub name: &'static str,
}

/// The memtrack query service.
///
/// Holds only the resolved report location, fixed at construction. Every
/// query re-reads the report from scratch, so concurrent callers are fully
/// independent and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Memtrack {
    report_path: PathBuf,
}

impl Memtrack {
    /// Creates a service reading the report at `report_path`.
    pub fn new(report_path: PathBuf) -> Self {
        Self { report_path }
    }

    /// Returns the accounting records for `mem_type` memory committed to
    /// `pid`.
    ///
    /// Only graphics memory is tracked on this platform; every other
    /// supported type reports empty. An empty result is also the normal
    /// outcome for a process with no tracked video memory.
    pub fn get_memory(&self, pid: Pid, mem_type: MemtrackType) -> Result<Vec<MemtrackRecord>> {
        check_pid(pid)?;

        match mem_type {
            MemtrackType::Graphics => Ok(vidmem::graphics_memory(&self.report_path, pid)),
            _ => Ok(Vec::new()),
        }
    }

    /// [`Memtrack::get_memory`], but taking the raw wire value of the memory
    /// type. Fails with [`MemtrackError::UnsupportedOperation`] for values
    /// outside the supported set.
    pub fn get_memory_raw(&self, pid: Pid, raw_type: i32) -> Result<Vec<MemtrackRecord>> {
        check_pid(pid)?;
        self.get_memory(pid, MemtrackType::try_from(raw_type)?)
    }

    /// Returns the descriptors of the GPU devices covered by this reporter.
    pub fn get_device_info(&self) -> Result<Vec<DeviceInfo>> {
        Ok(devices::GPU_DEVICES.to_vec())
    }
}

/// A pid has to be non-negative to ever be valid, regardless of memory type.
fn check_pid(pid: Pid) -> Result<()> {
    if pid < 0 {
        Err(MemtrackError::InvalidArgument(format!(
            "process id '{pid}' is negative"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CANONICAL: &str = "\
VidMem Usage (Process 126: surfaceflinger):
             Current     Maximum     Total
All-Types    16361320    16397908    17045756
";

    fn service_with(contents: &str) -> (tempfile::NamedTempFile, Memtrack) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let service = Memtrack::new(file.path().to_path_buf());

        (file, service)
    }

    #[test]
    fn negative_pid_is_invalid_for_every_type() {
        let (_file, service) = service_with(CANONICAL);

        for mem_type in MemtrackType::ALL {
            assert!(matches!(
                service.get_memory(-1, mem_type),
                Err(MemtrackError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn out_of_set_raw_types_are_unsupported() {
        let (_file, service) = service_with(CANONICAL);

        for raw in [-1, 5, 99] {
            assert!(matches!(
                service.get_memory_raw(126, raw),
                Err(MemtrackError::UnsupportedOperation(_))
            ));
        }
    }

    #[test]
    fn pid_validation_comes_before_type_validation() {
        let (_file, service) = service_with(CANONICAL);

        assert!(matches!(
            service.get_memory_raw(-1, 99),
            Err(MemtrackError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_graphics_types_report_empty() {
        let (_file, service) = service_with(CANONICAL);

        for mem_type in MemtrackType::ALL {
            if mem_type != MemtrackType::Graphics {
                assert_eq!(service.get_memory(126, mem_type), Ok(Vec::new()));
            }
        }
    }

    #[test]
    fn graphics_queries_read_the_report() {
        let (_file, service) = service_with(CANONICAL);
        let records = service.get_memory(126, MemtrackType::Graphics).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size_in_bytes, 16361320);
    }

    #[test]
    fn graphics_queries_via_raw_type_match() {
        let (_file, service) = service_with(CANONICAL);

        assert_eq!(
            service.get_memory_raw(126, MemtrackType::Graphics as i32),
            service.get_memory(126, MemtrackType::Graphics)
        );
    }

    #[test]
    fn repeated_queries_are_identical() {
        let (_file, service) = service_with(CANONICAL);

        let first = service.get_memory(126, MemtrackType::Graphics);
        let second = service.get_memory(126, MemtrackType::Graphics);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_report_is_a_successful_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let service = Memtrack::new(dir.path().join("vidmem"));

        assert_eq!(service.get_memory(126, MemtrackType::Graphics), Ok(Vec::new()));
    }

    #[test]
    fn device_info_is_fixed() {
        let (_file, service) = service_with(CANONICAL);
        let devices = service.get_device_info().unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, 0);
        assert_eq!(devices[0].name, "gcnano");
        assert_eq!(service.get_device_info().unwrap(), devices);
    }

    #[test]
    fn memory_type_parsing() {
        assert_eq!("graphics".parse::<MemtrackType>(), Ok(MemtrackType::Graphics));
        assert_eq!("GRAPHICS".parse::<MemtrackType>(), Ok(MemtrackType::Graphics));
        assert_eq!("gl".parse::<MemtrackType>(), Ok(MemtrackType::Gl));
        assert_eq!("2".parse::<MemtrackType>(), Ok(MemtrackType::Graphics));

        assert!(matches!(
            "dsp".parse::<MemtrackType>(),
            Err(MemtrackError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            "99".parse::<MemtrackType>(),
            Err(MemtrackError::UnsupportedOperation(_))
        ));
    }
}
