use super::common::*;
use crate::workflows::intake::domain::{ApplicationStatus, FilingDomain};
use crate::workflows::intake::state::{
    advance_step, check_document, resubmit, revert_step, update_status, StepRequirements,
    TransitionViolation,
};

#[test]
fn advances_to_same_or_higher_step() {
    let mut application = application(FilingDomain::Patent, "001");
    application.current_step = 3;

    let requirements = StepRequirements::none();
    assert_eq!(advance_step(&application, 3, &requirements), Ok(3));
    assert_eq!(advance_step(&application, 4, &requirements), Ok(4));
    assert_eq!(advance_step(&application, 7, &requirements), Ok(7));
}

#[test]
fn rejects_backward_step_through_advancement() {
    let mut application = application(FilingDomain::Patent, "002");
    application.current_step = 3;

    match advance_step(&application, 2, &StepRequirements::none()) {
        Err(TransitionViolation::BackwardStep {
            current: 3,
            requested: 2,
        }) => {}
        other => panic!("expected backward-step rejection, got {other:?}"),
    }
}

#[test]
fn rejects_step_outside_domain_bound() {
    let application = application(FilingDomain::Copyright, "003");

    match advance_step(&application, 6, &StepRequirements::none()) {
        Err(TransitionViolation::StepOutOfRange {
            requested: 6,
            max: 5,
            ..
        }) => {}
        other => panic!("expected out-of-range rejection, got {other:?}"),
    }
    match advance_step(&application, 0, &StepRequirements::none()) {
        Err(TransitionViolation::StepOutOfRange { requested: 0, .. }) => {}
        other => panic!("expected out-of-range rejection, got {other:?}"),
    }
}

#[test]
fn gates_step_entry_on_completed_documents() {
    let mut application = application(FilingDomain::Patent, "004");
    application.current_step = 4;
    let requirements = StepRequirements::none().require(5, [1, 2]);

    match advance_step(&application, 5, &requirements) {
        Err(TransitionViolation::MissingDocuments { requested: 5, missing }) => {
            assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        }
        other => panic!("expected missing-documents rejection, got {other:?}"),
    }

    application.completed_documents.extend([1, 2]);
    assert_eq!(advance_step(&application, 5, &requirements), Ok(5));
}

#[test]
fn revert_only_moves_backward() {
    let mut application = application(FilingDomain::Patent, "005");
    application.current_step = 4;

    assert_eq!(revert_step(&application, 2), Ok(2));
    match revert_step(&application, 4) {
        Err(TransitionViolation::InvalidRevert {
            current: 4,
            requested: 4,
        }) => {}
        other => panic!("expected invalid-revert rejection, got {other:?}"),
    }
    match revert_step(&application, 6) {
        Err(TransitionViolation::InvalidRevert { .. }) => {}
        other => panic!("expected invalid-revert rejection, got {other:?}"),
    }
}

#[test]
fn accepts_status_defined_by_the_domain() {
    let application = application(FilingDomain::Patent, "006");
    assert_eq!(
        update_status(&application, ApplicationStatus::UnderReview),
        Ok(ApplicationStatus::UnderReview)
    );
}

#[test]
fn rejects_status_from_another_domain() {
    let application = application(FilingDomain::Consultation, "007");

    match update_status(&application, ApplicationStatus::Granted) {
        Err(TransitionViolation::ForeignStatus {
            domain: FilingDomain::Consultation,
            status: ApplicationStatus::Granted,
        }) => {}
        other => panic!("expected foreign-status rejection, got {other:?}"),
    }
}

#[test]
fn terminal_status_accepts_no_updates() {
    let mut application = application(FilingDomain::Patent, "008");
    application.status = ApplicationStatus::Granted;

    match update_status(&application, ApplicationStatus::UnderReview) {
        Err(TransitionViolation::TerminalStatus {
            current: ApplicationStatus::Granted,
        }) => {}
        other => panic!("expected terminal-status rejection, got {other:?}"),
    }
}

#[test]
fn resubmission_reopens_only_rejected_filings() {
    let mut application = application(FilingDomain::Patent, "009");
    application.status = ApplicationStatus::Rejected;
    assert_eq!(resubmit(&application), Ok(ApplicationStatus::Submitted));

    application.status = ApplicationStatus::Granted;
    match resubmit(&application) {
        Err(TransitionViolation::NotResubmittable {
            current: ApplicationStatus::Granted,
        }) => {}
        other => panic!("expected not-resubmittable rejection, got {other:?}"),
    }

    application.status = ApplicationStatus::Draft;
    assert!(resubmit(&application).is_err());
}

#[test]
fn consultation_terminals_stay_closed() {
    let mut application = application(FilingDomain::Consultation, "010");
    for terminal in [ApplicationStatus::Completed, ApplicationStatus::Cancelled] {
        application.status = terminal;
        assert!(update_status(&application, ApplicationStatus::Pending).is_err());
        assert!(resubmit(&application).is_err());
    }
}

#[test]
fn document_types_are_a_closed_set() {
    assert!(check_document(FilingDomain::Patent, 4).is_ok());
    assert!(check_document(FilingDomain::Copyright, 3).is_ok());
    assert!(check_document(FilingDomain::Consultation, 1).is_ok());

    match check_document(FilingDomain::Consultation, 2) {
        Err(TransitionViolation::UnknownDocument {
            domain: FilingDomain::Consultation,
            document: 2,
        }) => {}
        other => panic!("expected unknown-document rejection, got {other:?}"),
    }
}
