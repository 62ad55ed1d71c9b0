// Platform limits queried once at startup

use log::debug;

/// Fallback when the platform does not expose its PID limit
pub const DEFAULT_MAX_PID: u32 = 99_999;

#[cfg(target_os = "linux")]
const PID_MAX_PATH: &str = "/proc/sys/kernel/pid_max";

/// Largest PID the kernel may hand out
#[cfg(target_os = "linux")]
pub fn max_pid() -> u32 {
    match std::fs::read_to_string(PID_MAX_PATH) {
        Ok(content) => parse_pid_max(&content).unwrap_or(DEFAULT_MAX_PID),
        Err(e) => {
            debug!("Could not read {}: {}", PID_MAX_PATH, e);
            DEFAULT_MAX_PID
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn max_pid() -> u32 {
    debug!("No PID limit source on this platform, using {}", DEFAULT_MAX_PID);
    DEFAULT_MAX_PID
}

/// Parse the content of a `pid_max` file
pub fn parse_pid_max(content: &str) -> Option<u32> {
    content.trim().parse::<u32>().ok().filter(|&max| max > 0)
}

#[cfg(unix)]
pub fn effective_user_id() -> u32 {
    // geteuid never fails
    unsafe { libc::geteuid() }
}

#[cfg(not(unix))]
pub fn effective_user_id() -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid_max() {
        assert_eq!(parse_pid_max("4194304\n"), Some(4_194_304));
        assert_eq!(parse_pid_max("  32768 "), Some(32_768));
        assert_eq!(parse_pid_max("0"), None);
        assert_eq!(parse_pid_max("garbage"), None);
    }

    #[test]
    fn test_max_pid_is_positive() {
        assert!(max_pid() > 0);
    }
}
