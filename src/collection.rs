//! Collection of video memory usage data from the kernel report.

pub mod devices;
pub mod vidmem;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_family = "unix")] {
        /// A UNIX process ID.
        pub type Pid = libc::pid_t;
    } else {
        /// A process ID.
        pub type Pid = i32;
    }
}
