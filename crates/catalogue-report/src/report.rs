use std::borrow::Cow;

const INDENT: &str = "    ";

/// A caught failure that can be written into a log report.
///
/// `root_cause` is optional: failures that do not chain return `None`, which
/// reports the same as a chained failure whose cause is absent.
pub trait Reportable {
    /// Short type name, e.g. `IOError` or `LoadError`.
    fn type_name(&self) -> Cow<'_, str>;

    fn message(&self) -> Cow<'_, str>;

    /// Trace locations, innermost first.
    fn trace(&self) -> &[String];

    /// The underlying failure, if any. May return `self`.
    fn root_cause(&self) -> Option<&dyn Reportable> {
        None
    }
}

/// Format a failure as indented log text.
///
/// ```text
///     Exception: IOError: disk full
///     /srv/catalogue/writer.rs:12:in `write`
///     Caused by
///     OSError: ENOSPC
///     /srv/catalogue/fs.rs:80:in `flush`
/// ```
///
/// The first trace entry is written as-is; a failure with an empty trace has no
/// trace line. A root cause that is the failure itself is not repeated.
pub fn format_failure(failure: &dyn Reportable) -> String {
    let mut msg = format!(
        "{INDENT}Exception: {}: {}\n",
        failure.type_name(),
        failure.message()
    );
    push_first_frame(&mut msg, failure);

    if let Some(cause) = failure.root_cause()
        && !same_object(cause, failure)
    {
        msg.push_str(INDENT);
        msg.push_str("Caused by\n");
        msg.push_str(&format!(
            "{INDENT}{}: {}\n",
            cause.type_name(),
            cause.message()
        ));
        push_first_frame(&mut msg, cause);
    }

    msg
}

fn same_object(a: &dyn Reportable, b: &dyn Reportable) -> bool {
    std::ptr::addr_eq(a as *const _, b as *const _)
}

fn push_first_frame(msg: &mut String, failure: &dyn Reportable) {
    if let Some(frame) = failure.trace().first() {
        msg.push_str(INDENT);
        msg.push_str(frame);
        msg.push('\n');
    }
}

/// An owned failure description.
///
/// Useful when the original error value is gone (crossed a thread or an FFI
/// boundary) but its report still has to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    type_name: String,
    message: String,
    trace: Vec<String>,
    root_cause: Option<Box<Failure>>,
}

impl Failure {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            trace: Vec::new(),
            root_cause: None,
        }
    }

    pub fn with_trace<I, S>(mut self, trace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trace = trace.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_root_cause(mut self, cause: Failure) -> Self {
        self.root_cause = Some(Box::new(cause));
        self
    }
}

impl Reportable for Failure {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.type_name.as_str())
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.message.as_str())
    }

    fn trace(&self) -> &[String] {
        &self.trace
    }

    fn root_cause(&self) -> Option<&dyn Reportable> {
        self.root_cause.as_deref().map(|c| c as &dyn Reportable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk_full() -> Failure {
        Failure::new("IOError", "disk full").with_trace(["/a/b.ext:12:in `write`"])
    }

    /// A failure that names itself as its own root cause.
    struct Looping {
        trace: Vec<String>,
    }

    impl Reportable for Looping {
        fn type_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("IOError")
        }

        fn message(&self) -> Cow<'_, str> {
            Cow::Borrowed("disk full")
        }

        fn trace(&self) -> &[String] {
            &self.trace
        }

        fn root_cause(&self) -> Option<&dyn Reportable> {
            Some(self as &dyn Reportable)
        }
    }

    #[test]
    fn test_without_root_cause() {
        let report = format_failure(&disk_full());
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].trim(), "Exception: IOError: disk full");
        assert!(lines[1].contains("/a/b.ext:12"));
        assert!(!report.contains("Caused by"));
    }

    #[test]
    fn test_exact_layout() {
        assert_eq!(
            format_failure(&disk_full()),
            "    Exception: IOError: disk full\n    /a/b.ext:12:in `write`\n"
        );
    }

    #[test]
    fn test_with_root_cause() {
        let failure = disk_full().with_root_cause(
            Failure::new("OSError", "ENOSPC").with_trace(["/a/fs.ext:80:in `flush`"]),
        );
        let report = format_failure(&failure);
        assert_eq!(
            report,
            "    Exception: IOError: disk full\n    /a/b.ext:12:in `write`\n    Caused by\n    OSError: ENOSPC\n    /a/fs.ext:80:in `flush`\n"
        );
    }

    #[test]
    fn test_self_referential_root_cause_suppressed() {
        let failure = Looping {
            trace: vec!["/a/b.ext:12:in `write`".to_string()],
        };
        let report = format_failure(&failure);
        assert!(report.starts_with("    Exception: IOError: disk full\n"));
        assert!(!report.contains("Caused by"));
    }

    #[test]
    fn test_empty_trace_omits_frame_line() {
        let report = format_failure(&Failure::new("IOError", "disk full"));
        assert_eq!(report, "    Exception: IOError: disk full\n");
    }

    #[test]
    fn test_root_cause_with_empty_trace() {
        let failure = disk_full().with_root_cause(Failure::new("OSError", "ENOSPC"));
        let report = format_failure(&failure);
        assert!(report.ends_with("    Caused by\n    OSError: ENOSPC\n"));
    }
}
