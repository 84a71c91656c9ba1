/// Desktop notifications
/// Currently only implements macOS notifications

#[cfg(target_os = "macos")]
use std::process::Command;

/// Quote text as an AppleScript string literal body
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build the AppleScript for a notification
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn notification_script(title: &str, body: &str) -> String {
    format!(
        r#"display notification "{}" with title "{}""#,
        escape_applescript(body),
        escape_applescript(title)
    )
}

#[cfg(target_os = "macos")]
fn send(title: &str, body: &str) {
    let script = notification_script(title, body);
    if let Err(e) = Command::new("osascript").arg("-e").arg(&script).output() {
        tracing::debug!(error = %e, "notification failed");
    }
}

#[cfg(not(target_os = "macos"))]
fn send(title: &str, body: &str) {
    // No-op on other platforms
    tracing::debug!(title, body, "notification skipped on this platform");
}

/// Send a notification when a countdown reaches zero
pub fn notify_time_up(task_name: &str) {
    send(
        "Kairos - Time's up!",
        &format!("\"{}\" is done. Move on to your next task.", task_name),
    );
}

/// Send a notification when a task is completed
pub fn notify_task_completed(task_name: &str, actual_minutes: u64) {
    send(
        "Kairos - Task Completed",
        &format!("{} ({}m)", task_name, actual_minutes),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_script_escapes_quotes() {
        let script = notification_script("Title", r#"Say "hi""#);
        assert_eq!(
            script,
            r#"display notification "Say \"hi\"" with title "Title""#
        );
    }

    #[test]
    fn test_notification_script_escapes_backslashes() {
        let script = notification_script(r#"Dir \"#, r#"C:\tmp\" & quit"#);
        assert_eq!(
            script,
            r#"display notification "C:\\tmp\\\" & quit" with title "Dir \\""#
        );
    }
}
