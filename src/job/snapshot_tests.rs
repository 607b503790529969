//! Tests for execution snapshots and duration text.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{Execution, ExecutionSnapshot, JobInfo, format_duration};

fn started() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-05T14:07:09Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn finished(error: Option<&str>) -> Execution {
    let start = started();
    let mut execution = Execution::start("exec-1", start);
    execution.stdout = "out".into();
    execution.stop(
        start + chrono::Duration::seconds(83),
        error.map(ToString::to_string),
    );
    execution
}

fn info() -> JobInfo {
    JobInfo::new("backup", "@daily", "tar -czf out.tgz /data")
}

mod snapshot {
    use super::*;

    #[test]
    fn successful_execution() {
        let snapshot = ExecutionSnapshot::with_hostname(&info(), &finished(None), "host-a".into());

        assert_eq!(snapshot.job_name, "backup");
        assert_eq!(snapshot.duration, "1m23s");
        assert!(snapshot.success);
        assert!(!snapshot.failed);
        assert!(!snapshot.has_error);
        assert_eq!(snapshot.error, "");
        assert_eq!(snapshot.hostname, "host-a");
        assert_eq!(snapshot.timestamp, "2024-03-05T14:07:09Z");
        assert_eq!(snapshot.end_time, started() + chrono::Duration::seconds(83));
    }

    #[test]
    fn failed_execution() {
        let snapshot =
            ExecutionSnapshot::with_hostname(&info(), &finished(Some("exit 2")), String::new());

        assert!(snapshot.failed);
        assert!(!snapshot.success);
        assert!(snapshot.has_error);
        assert_eq!(snapshot.error, "exit 2");
    }

    #[test]
    fn skipped_execution_is_not_success() {
        let mut execution = finished(None);
        execution.skip();

        let snapshot = ExecutionSnapshot::with_hostname(&info(), &execution, String::new());

        assert!(snapshot.skipped);
        assert!(!snapshot.failed);
        assert!(!snapshot.success);
    }

    #[test]
    fn serializes_with_template_field_names() {
        let snapshot = ExecutionSnapshot::with_hostname(&info(), &finished(None), "h".into());
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["JobName"], json!("backup"));
        assert_eq!(value["JobSchedule"], json!("@daily"));
        assert_eq!(value["ExecutionID"], json!("exec-1"));
        assert_eq!(value["StartTime"], json!("2024-03-05T14:07:09Z"));
        assert_eq!(value["EndTime"], json!("2024-03-05T14:08:32Z"));
        assert_eq!(value["IsRunning"], json!(false));
        assert_eq!(value["HasError"], json!(false));
        assert_eq!(value["Stdout"], json!("out"));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 17);
    }

    #[test]
    fn capture_fills_hostname() {
        let snapshot = ExecutionSnapshot::capture(&info(), &finished(None));
        assert_eq!(snapshot.job_name, "backup");
    }
}

mod execution {
    use super::*;

    #[test]
    fn stop_before_start_clamps_to_zero() {
        let start = started();
        let mut execution = Execution::start("x", start);
        execution.stop(start - chrono::Duration::seconds(5), None);

        assert_eq!(execution.duration, Duration::ZERO);
        assert_eq!(execution.ended_at(), start);
    }

    #[test]
    fn ids_differ_by_start_time() {
        let start = started();
        assert_ne!(
            Execution::id_for(start),
            Execution::id_for(start + chrono::Duration::milliseconds(1))
        );
    }
}

mod duration_text {
    use super::*;

    #[test]
    fn zero() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn sub_second_units() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_micros(1_250)), "1.25ms");
    }

    #[test]
    fn seconds_and_minutes() {
        assert_eq!(format_duration(Duration::from_millis(1_500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(83)), "1m23s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
    }

    #[test]
    fn hours_keep_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_millis(7_384_500)), "2h3m4.5s");
    }
}
