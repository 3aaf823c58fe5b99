use super::scenario::{Scenario, SOAP11_OK};

#[test]
fn drop_in_flight_unbinds_then_aborts() {
    let scenario = Scenario::builder().in_flight().build();
    let tracker = scenario.tracker.clone();

    drop(scenario.call);

    // Abort would notify, but the callback is already gone.
    assert_eq!(*tracker.events.borrow(), ["unbind", "abort"]);
    assert_eq!(tracker.count("notify"), 0);
}

#[test]
fn abort_runs_once_for_last_clone() {
    let scenario = Scenario::builder().in_flight().build();
    let tracker = scenario.tracker.clone();

    let c1 = scenario.call.clone();
    let c2 = c1.clone();

    drop(scenario.call);
    drop(c1);
    assert_eq!(tracker.count("abort"), 0);

    drop(c2);
    assert_eq!(tracker.count("abort"), 1);
    assert_eq!(tracker.count("unbind"), 1);
}

#[test]
fn drop_after_parse_still_aborts() {
    let scenario = Scenario::builder().body(SOAP11_OK).build();
    let tracker = scenario.tracker.clone();

    assert_eq!(scenario.call.return_value().value(), Some("France"));
    drop(scenario.call);

    assert_eq!(*tracker.events.borrow(), ["unbind", "abort"]);
}

#[test]
fn parsed_result_outlives_handle() {
    let scenario = Scenario::builder().body(SOAP11_OK).build();

    let message = scenario.call.return_message();
    drop(scenario.call);

    assert_eq!(message.name(), "getEmployeeCountryResponse");
}
