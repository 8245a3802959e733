mod support;

use assert_matches::assert_matches;

use serde_json::json;

use appointment_cell::{
    AppointmentError, AppointmentStatus, BookingOrigin, BookingRules, BookingService,
    ClinicDirectory, ErrorKind, ServiceRef, UpdateAppointmentRequest,
};
use shared_utils::test_utils::{date, time, MockClinicData, TestConfig};

use support::{
    appointment, clinic_directory, directory_json, now, request, rules, today, MONDAY,
};

#[test]
fn test_root_canal_over_confirmed_consultation_is_rejected() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![appointment("apt001", "doc001", MONDAY, "09:30", &["srv001"], "confirmed")];

    let result = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "09:00", &["srv002"]),
        &existing,
        today(),
        now(),
    );

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SlotConflict);
    assert_matches!(
        err,
        AppointmentError::Overlap { ref conflicting_id, requested, existing, .. }
            if conflicting_id == "apt001"
                && requested.to_string() == "09:00-10:30"
                && existing.to_string() == "09:30-10:00"
    );
}

#[test]
fn test_same_request_succeeds_when_existing_is_cancelled() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![appointment("apt001", "doc001", MONDAY, "09:30", &["srv001"], "cancelled")];

    let created = booking
        .validate_and_create(
            &request(Some("doc001"), MONDAY, "09:00", &["srv002"]),
            &existing,
            today(),
            now(),
        )
        .unwrap();

    assert_eq!(created.doctor_id, "doc001");
    assert_eq!(created.date, date(MONDAY));
    assert_eq!(created.time, time("09:00"));
    assert_eq!(created.status, AppointmentStatus::Pending);
    assert_eq!(created.service_name.as_deref(), Some("Root Canal"));
    assert!(created.id.starts_with("apt_"));
    assert_eq!(created.created_at, now());
}

#[test]
fn test_staff_bookings_start_confirmed() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let mut staff_request = request(Some("doc002"), MONDAY, "14:00", &["srv001", "promo_p2"]);
    staff_request.origin = BookingOrigin::Staff;

    let created = booking
        .validate_and_create(&staff_request, &[], today(), now())
        .unwrap();
    assert_eq!(created.status, AppointmentStatus::Confirmed);
    assert_eq!(created.service_name.as_deref(), Some("Consultation, Braces Promo"));
    assert_eq!(
        created.services,
        vec![
            ServiceRef::Service("srv001".to_string()),
            ServiceRef::Promotion("p2".to_string())
        ]
    );
}

#[test]
fn test_booking_window_limits() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let past = booking.validate_and_create(
        &request(Some("doc001"), "2024-06-07", "09:00", &["srv001"]),
        &[],
        today(),
        now(),
    );
    assert_matches!(past, Err(AppointmentError::PastDate { .. }));

    let today_ok = booking.validate_and_create(
        &request(Some("doc001"), "2024-06-08", "09:00", &["srv001"]),
        &[],
        today(),
        now(),
    );
    assert!(today_ok.is_ok());

    let last_day = booking.validate_and_create(
        &request(Some("doc001"), "2024-06-22", "09:00", &["srv001"]),
        &[],
        today(),
        now(),
    );
    assert!(last_day.is_ok());

    let too_far = booking.validate_and_create(
        &request(Some("doc001"), "2024-06-23", "09:00", &["srv001"]),
        &[],
        today(),
        now(),
    );
    let err = too_far.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BookingWindowViolation);
    assert_matches!(
        err,
        AppointmentError::BeyondHorizon { latest, horizon_days: 14, .. } if latest == date("2024-06-22")
    );
}

#[test]
fn test_window_is_checked_before_conflicts() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![appointment("apt001", "doc001", "2024-06-07", "09:00", &["srv001"], "confirmed")];

    let result = booking.validate_and_create(
        &request(Some("doc001"), "2024-06-07", "09:00", &["srv001"]),
        &existing,
        today(),
        now(),
    );
    assert_matches!(result, Err(AppointmentError::PastDate { .. }));
}

#[test]
fn test_slot_cap_enforced_exactly_at_boundary() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let mut existing: Vec<_> = (1..=4)
        .map(|n| {
            appointment(
                &format!("apt00{}", n),
                &format!("doc00{}", n),
                MONDAY,
                "10:00",
                &["srv001"],
                "confirmed",
            )
        })
        .collect();

    let fifth = booking
        .validate_and_create(
            &request(Some("doc005"), MONDAY, "10:00", &["srv001"]),
            &existing,
            today(),
            now(),
        )
        .unwrap();
    existing.push(fifth);

    let sixth = booking.validate_and_create(
        &request(Some("doc006"), MONDAY, "10:00", &["srv001"]),
        &existing,
        today(),
        now(),
    );
    let err = sixth.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert_matches!(err, AppointmentError::SlotFull { cap: 5, .. });
}

#[test]
fn test_cancelled_appointments_do_not_count_toward_caps() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let existing: Vec<_> = (1..=5)
        .map(|n| {
            appointment(
                &format!("apt00{}", n),
                &format!("doc00{}", n),
                MONDAY,
                "10:00",
                &["srv001"],
                "cancelled",
            )
        })
        .collect();

    let result = booking.validate_and_create(
        &request(Some("doc006"), MONDAY, "10:00", &["srv001"]),
        &existing,
        today(),
        now(),
    );
    assert!(result.is_ok());
}

#[test]
fn test_day_cap() {
    let directory = clinic_directory();
    let rules = BookingRules::from(
        &TestConfig {
            max_appointments_per_day: 3,
            ..TestConfig::default()
        }
        .to_scheduling_config(),
    );
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![
        appointment("apt001", "doc001", MONDAY, "09:00", &["srv001"], "confirmed"),
        appointment("apt002", "doc002", MONDAY, "11:00", &["srv001"], "pending"),
        appointment("apt003", "doc003", MONDAY, "15:00", &["srv001"], "confirmed"),
    ];

    let result = booking.validate_and_create(
        &request(Some("doc004"), MONDAY, "13:00", &["srv001"]),
        &existing,
        today(),
        now(),
    );
    assert_matches!(result, Err(AppointmentError::DayFull { cap: 3, .. }));
}

#[test]
fn test_unknown_references_are_not_found() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let missing_doctor = booking
        .validate_and_create(&request(Some("doc999"), MONDAY, "09:00", &["srv001"]), &[], today(), now())
        .unwrap_err();
    assert_matches!(missing_doctor, AppointmentError::DoctorNotFound(ref id) if id == "doc999");
    assert_eq!(missing_doctor.kind(), ErrorKind::NotFound);

    let missing_service = booking
        .validate_and_create(&request(Some("doc001"), MONDAY, "09:00", &["srv999"]), &[], today(), now())
        .unwrap_err();
    assert_eq!(missing_service.kind(), ErrorKind::NotFound);
}

#[test]
fn test_requested_time_must_fit_working_hours() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    // 16:00 + 90 min runs past the 17:00 end; never clamped.
    let late = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "16:00", &["srv002"]),
        &[],
        today(),
        now(),
    );
    assert_matches!(late, Err(AppointmentError::OutsideAvailability { .. }));

    let early = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "08:30", &["srv001"]),
        &[],
        today(),
        now(),
    );
    assert_matches!(early, Err(AppointmentError::OutsideAvailability { .. }));

    let fits = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "15:30", &["srv002"]),
        &[],
        today(),
        now(),
    );
    assert!(fits.is_ok());
}

#[test]
fn test_absurdly_long_service_is_rejected_as_outside_hours() {
    let mut raw = directory_json();
    raw["services"]
        .as_array_mut()
        .unwrap()
        .push(MockClinicData::service("srv_big", "Marathon", json!(4294967000u64)));
    let directory: ClinicDirectory = serde_json::from_value(raw).unwrap();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let result = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "09:00", &["srv_big", "srv_big"]),
        &[],
        today(),
        now(),
    );
    assert_matches!(result, Err(AppointmentError::OutsideAvailability { .. }));
}

#[test]
fn test_unavailable_doctor_is_rejected() {
    let mut directory = clinic_directory();
    directory.doctors[0].available = false;
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    let result = booking.validate_and_create(
        &request(Some("doc001"), MONDAY, "09:00", &["srv001"]),
        &[],
        today(),
        now(),
    );
    assert_matches!(result, Err(AppointmentError::DoctorUnavailable(ref id)) if id == "doc001");
}

#[test]
fn test_break_enforcement_is_optional() {
    let directory = clinic_directory();

    let relaxed = rules();
    let booking = BookingService::new(&directory, &directory, &relaxed);
    assert!(booking
        .validate_and_create(&request(Some("doc001"), MONDAY, "12:00", &["srv001"]), &[], today(), now())
        .is_ok());

    let strict = BookingRules {
        enforce_break_times: true,
        ..rules()
    };
    let booking = BookingService::new(&directory, &directory, &strict);
    assert_matches!(
        booking.validate_and_create(
            &request(Some("doc001"), MONDAY, "11:30", &["srv001"]),
            &[],
            today(),
            now()
        ),
        Err(AppointmentError::OutsideAvailability { .. })
    );
    assert!(booking
        .validate_and_create(&request(Some("doc001"), MONDAY, "13:30", &["srv001"]), &[], today(), now())
        .is_ok());
}

#[test]
fn test_missing_doctor_is_auto_assigned_first_fit() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![appointment("apt001", "doc001", MONDAY, "09:00", &["srv001"], "confirmed")];

    let created = booking
        .validate_and_create(&request(None, MONDAY, "09:00", &["srv001"]), &existing, today(), now())
        .unwrap();
    assert_eq!(created.doctor_id, "doc002");
}

#[test]
fn test_auto_assignment_reports_when_nobody_is_free() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);

    // Every doctor works until 17:00.
    let result = booking.validate_and_create(
        &request(None, MONDAY, "16:45", &["srv001"]),
        &[],
        today(),
        now(),
    );
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoDoctorAvailable);
}

#[test]
fn test_reschedule_rechecks_conflicts_excluding_itself() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![
        appointment("apt001", "doc001", MONDAY, "09:00", &["srv002"], "confirmed"),
        appointment("apt002", "doc001", MONDAY, "11:00", &["srv001"], "confirmed"),
    ];

    // Sliding later by 30 minutes only overlaps its own old slot.
    let shifted = booking
        .validate_and_update(
            &existing[0],
            &UpdateAppointmentRequest {
                time: Some(time("09:30")),
                ..Default::default()
            },
            &existing,
            now(),
        )
        .unwrap();
    assert_eq!(shifted.time, time("09:30"));
    assert_eq!(shifted.id, "apt001");

    let clash = booking.validate_and_update(
        &existing[0],
        &UpdateAppointmentRequest {
            time: Some(time("10:00")),
            ..Default::default()
        },
        &existing,
        now(),
    );
    assert_matches!(clash, Err(AppointmentError::Overlap { ref conflicting_id, .. }) if conflicting_id == "apt002");

    let other_doctor = booking
        .validate_and_update(
            &existing[0],
            &UpdateAppointmentRequest {
                time: Some(time("10:00")),
                doctor_id: Some("doc002".to_string()),
                ..Default::default()
            },
            &existing,
            now(),
        )
        .unwrap();
    assert_eq!(other_doctor.doctor_id, "doc002");
}

#[test]
fn test_reschedule_ignores_creation_only_limits() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![appointment("apt001", "doc001", "2024-06-07", "09:00", &["srv001"], "confirmed")];

    // A past-dated appointment can still have its time corrected.
    let updated = booking
        .validate_and_update(
            &existing[0],
            &UpdateAppointmentRequest {
                time: Some(time("10:00")),
                ..Default::default()
            },
            &existing,
            now(),
        )
        .unwrap();
    assert_eq!(updated.time, time("10:00"));
}

#[test]
fn test_changing_services_recomputes_duration() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let existing = vec![
        appointment("apt001", "doc001", MONDAY, "09:00", &["srv001"], "pending"),
        appointment("apt002", "doc001", MONDAY, "10:00", &["srv001"], "pending"),
    ];

    let result = booking.validate_and_update(
        &existing[0],
        &UpdateAppointmentRequest {
            services: Some(vec![ServiceRef::Service("srv002".to_string())]),
            ..Default::default()
        },
        &existing,
        now(),
    );
    assert_matches!(result, Err(AppointmentError::Overlap { .. }));
}

#[test]
fn test_terminal_appointments_keep_their_slot() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let done = appointment("apt001", "doc001", MONDAY, "09:00", &["srv001"], "cancelled");

    let result = booking.validate_and_update(
        &done,
        &UpdateAppointmentRequest {
            date: Some(date("2024-06-11")),
            ..Default::default()
        },
        &[done.clone()],
        now(),
    );
    assert_matches!(result, Err(AppointmentError::TerminalAppointmentEdit { .. }));

    let noted = booking
        .validate_and_update(
            &done,
            &UpdateAppointmentRequest {
                notes: Some("Patient called to apologise".to_string()),
                ..Default::default()
            },
            &[done.clone()],
            now(),
        )
        .unwrap();
    assert_eq!(noted.notes.as_deref(), Some("Patient called to apologise"));
    assert_eq!(noted.status, AppointmentStatus::Cancelled);
}

#[test]
fn test_status_transition_through_booking_service() {
    let directory = clinic_directory();
    let rules = rules();
    let booking = BookingService::new(&directory, &directory, &rules);
    let pending = appointment("apt001", "doc001", MONDAY, "09:00", &["srv001"], "pending");

    assert_matches!(
        booking.validate_and_transition_status(&pending, AppointmentStatus::Completed, now()),
        Err(AppointmentError::MustConfirmFirst)
    );

    let confirmed = booking
        .validate_and_transition_status(&pending, AppointmentStatus::Confirmed, now())
        .unwrap();
    let completed = booking
        .validate_and_transition_status(&confirmed, AppointmentStatus::Completed, now())
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    assert_matches!(
        booking.validate_and_transition_status(&completed, AppointmentStatus::Cancelled, now()),
        Err(AppointmentError::Terminal(AppointmentStatus::Completed))
    );
}
