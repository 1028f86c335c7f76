use tickler::error::Error;
use tickler::output::{format_human, HumanOutput, SCHEMA_VERSION};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Payroll run: paused");
    human.push_summary("Task", "payroll");
    human.push_detail("2025-12-01 upcoming Payroll run");
    human.push_warning("task is stopped");
    human.push_next_step("tickler list --all");

    let rendered = format_human(&human);
    assert!(rendered.starts_with("Payroll run: paused\n"));
    assert!(rendered.contains("  Task: payroll"));
    assert!(rendered.contains("  2025-12-01 upcoming Payroll run"));
    assert!(rendered.contains("warning: task is stopped"));
    assert!(rendered.ends_with("next: tickler list --all"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("Task created");
    assert_eq!(format_human(&human), "Task created");
}

#[test]
fn schema_version_names_the_tool() {
    assert!(SCHEMA_VERSION.starts_with("tickler."));
}

#[test]
fn error_display_names_the_task() {
    let err = Error::TaskNotFound("rent".to_string());
    assert_eq!(err.to_string(), "Task not found: rent");
}
