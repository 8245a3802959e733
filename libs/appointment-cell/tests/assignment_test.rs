mod support;

use doctor_cell::Doctor;
use serde_json::json;

use appointment_cell::{ClinicDirectory, DoctorAssignmentService};
use shared_utils::test_utils::{time, MockClinicData};

use support::{appointment, clinic_directory, directory_json, monday, MONDAY};

fn doctors(ids: &[(&str, bool)]) -> Vec<Doctor> {
    ids.iter()
        .map(|(id, available)| {
            serde_json::from_value(MockClinicData::doctor(id, &format!("Dr. {}", id), *available))
                .unwrap()
        })
        .collect()
}

#[test]
fn test_first_free_doctor_in_input_order() {
    let directory = clinic_directory();
    let assignment = DoctorAssignmentService::new(&directory);
    let roster = doctors(&[("D1", true), ("D2", true), ("D3", true)]);
    let existing = vec![appointment("apt001", "D1", MONDAY, "09:00", &["srv002"], "confirmed")];

    let chosen = assignment.find_available_doctor(monday(), time("09:30"), 30, &roster, &existing, None);

    assert_eq!(chosen.map(|d| d.id.as_str()), Some("D2"));
}

#[test]
fn test_unavailable_doctors_are_skipped() {
    let directory = clinic_directory();
    let assignment = DoctorAssignmentService::new(&directory);
    let roster = doctors(&[("D1", false), ("D2", false), ("D3", true)]);

    let chosen = assignment.find_available_doctor(monday(), time("09:00"), 30, &roster, &[], None);

    assert_eq!(chosen.map(|d| d.id.as_str()), Some("D3"));
}

#[test]
fn test_no_doctor_when_everyone_is_busy_or_list_is_empty() {
    let directory = clinic_directory();
    let assignment = DoctorAssignmentService::new(&directory);
    let roster = doctors(&[("D1", true), ("D2", true)]);
    let existing = vec![
        appointment("apt001", "D1", MONDAY, "09:00", &["srv001"], "confirmed"),
        appointment("apt002", "D2", MONDAY, "09:15", &["srv001"], "pending"),
    ];

    assert!(assignment
        .find_available_doctor(monday(), time("09:00"), 30, &roster, &existing, None)
        .is_none());
    assert!(assignment
        .find_available_doctor(monday(), time("09:00"), 30, &[], &[], None)
        .is_none());
}

#[test]
fn test_excluded_appointment_frees_its_doctor() {
    let directory = clinic_directory();
    let assignment = DoctorAssignmentService::new(&directory);
    let roster = doctors(&[("D1", true), ("D2", true)]);
    let existing = vec![appointment("apt001", "D1", MONDAY, "09:00", &["srv001"], "confirmed")];

    let chosen =
        assignment.find_available_doctor(monday(), time("09:00"), 30, &roster, &existing, Some("apt001"));

    assert_eq!(chosen.map(|d| d.id.as_str()), Some("D1"));
}

#[test]
fn test_within_hours_variant_respects_weekly_schedule() {
    let mut raw = directory_json();
    raw["doctors"] = json!([
        MockClinicData::doctor("doc001", "Dr. Morning", true),
        MockClinicData::doctor("doc002", "Dr. Afternoon", true)
    ]);
    raw["schedules"] = json!([
        MockClinicData::schedule("s1", "doc001", "Monday", "09:00", "12:00"),
        MockClinicData::schedule("s2", "doc002", "Monday", "13:00", "18:00")
    ]);
    let directory: ClinicDirectory = serde_json::from_value(raw).unwrap();
    let assignment = DoctorAssignmentService::new(&directory);

    let morning =
        assignment.find_available_doctor_within_hours(&directory, monday(), time("10:00"), 30, &[], None);
    assert_eq!(morning.map(|d| d.id.as_str()), Some("doc001"));

    let afternoon =
        assignment.find_available_doctor_within_hours(&directory, monday(), time("14:00"), 30, &[], None);
    assert_eq!(afternoon.map(|d| d.id.as_str()), Some("doc002"));

    // Runs past the morning shift and starts before the afternoon one.
    let straddling =
        assignment.find_available_doctor_within_hours(&directory, monday(), time("11:45"), 30, &[], None);
    assert!(straddling.is_none());
}
