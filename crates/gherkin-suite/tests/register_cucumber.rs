//! Registering features through the cucumber interface.

use std::cell::RefCell;
use std::rc::Rc;

use gherkin_suite::{
    HarnessConfig, Initializer, RootSuite, RunError, StepDefinitions, StepError, SuiteNode,
    get_interface, register_cucumber,
};
use gherkin_suite_adapter::test_utils::RecordingHost;
use rstest::{fixture, rstest};

#[fixture]
fn root() -> RootSuite {
    RootSuite::new(HarnessConfig::default())
}

fn steps(f: impl Fn(&mut StepDefinitions) + 'static) -> Initializer {
    Box::new(f)
}

fn run_single(root: &mut RootSuite) -> &SuiteNode {
    let host = RecordingHost::new();
    root.run_blocking(&host)
        .unwrap_or_else(|err| panic!("runtime should start: {err}"));
    root.suites()
        .first()
        .and_then(|s| s.suite())
        .unwrap_or_else(|| panic!("the feature should have run"))
}

fn message_of(suite: &SuiteNode, test: &str) -> Option<String> {
    suite
        .test(test)
        .and_then(|t| t.error())
        .map(|e| e.message.clone())
}

#[rstest]
fn registering_adds_one_named_suite(mut root: RootSuite) {
    let suite = register_cucumber(&mut root, "dummy", "Feature: ...", Vec::new());
    assert_eq!(suite.name(), "dummy");
    assert!(suite.report().is_none());
    assert_eq!(root.suites().len(), 1);
    assert!(root.suite("dummy").is_some());
}

#[rstest]
fn empty_feature_builds_an_empty_suite(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber("dummy", "Feature: ...", Vec::new());
    let suite = run_single(&mut root);
    assert_eq!(suite.name(), "dummy");
    assert_eq!(suite.num_tests(), 0);
    assert!(suite.error().is_none());
}

#[rstest]
fn single_scenario_passes(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A scenario\nGiven x = 5",
        vec![steps(|s| {
            s.given("x = 5", |_, _| Ok(()));
        })],
    );
    let suite = run_single(&mut root);
    assert_eq!(suite.num_tests(), 1);
    assert_eq!(suite.num_passed_tests(), 1);
    assert_eq!(suite.num_failed_tests(), 0);
    assert!(suite.test("A scenario").is_some_and(|t| t.has_passed()));
}

#[rstest]
fn outline_examples_become_numbered_tests(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario Outline: A scenario with examples\nGiven x = <x>\nExamples:\n|x|\n|1|\n|2|\n|3|\n",
        vec![steps(|s| {
            s.given("x = {int}", |_, args| args.parse::<i32>(0).map(drop));
        })],
    );
    let suite = run_single(&mut root);
    let names: Vec<&str> = suite.children().iter().map(|t| t.name()).collect();
    assert_eq!(
        names,
        [
            "A scenario with examples",
            "A scenario with examples (2)",
            "A scenario with examples (3)",
        ]
    );
    assert_eq!(suite.num_passed_tests(), 3);
}

#[rstest]
fn repeated_steps_share_one_definition(mut root: RootSuite) {
    let calls = Rc::new(RefCell::new(0_u32));
    let counter = Rc::clone(&calls);
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A scenario\nGiven x = 5\nAnd x = 5\nAnd x = 5",
        vec![steps(move |s| {
            let counter = Rc::clone(&counter);
            s.given("x = 5", move |_, _| {
                *counter.borrow_mut() += 1;
                Ok(())
            });
        })],
    );
    let suite = run_single(&mut root);
    assert_eq!(suite.num_tests(), 1);
    assert!(suite.test("A scenario").is_some_and(|t| t.has_passed()));
    assert_eq!(*calls.borrow(), 3);
}

#[rstest]
fn every_initializer_contributes_definitions(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A scenario\nGiven x = 5\nThen x == 5",
        vec![
            steps(|s| {
                s.given("x = 5", |_, _| Ok(()));
            }),
            steps(|s| {
                s.then("x == 5", |_, _| Ok(()));
            }),
        ],
    );
    let suite = run_single(&mut root);
    assert!(suite.test("A scenario").is_some_and(|t| t.has_passed()));
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeRemote {
    fake: &'static str,
}

#[rstest]
fn remote_is_part_of_the_world() {
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let mut root: RootSuite =
        RootSuite::new(HarnessConfig::default()).with_remote(FakeRemote { fake: "fake remote" });
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A scenario\nGiven x = 5",
        vec![steps(move |s| {
            let sink = Rc::clone(&sink);
            s.given("x = 5", move |world, _| {
                let remote = world
                    .remote::<FakeRemote>()
                    .ok_or_else(|| StepError::new("\"remote\" should be part of the World"))?;
                *sink.borrow_mut() = Some(remote.clone());
                Ok(())
            });
        })],
    );
    let suite = run_single(&mut root);
    assert!(suite.test("A scenario").is_some_and(|t| t.has_passed()));
    assert_eq!(
        seen.borrow().as_ref(),
        Some(&FakeRemote { fake: "fake remote" })
    );
}

#[rstest]
fn failing_step_reports_the_step_and_reason(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A failing test step\nGiven x = 5\nAnd y = 5",
        vec![steps(|s| {
            s.given("x = 5", |_, _| Ok(()))
                .given("y = 5", |_, _| Err(StepError::new("This fails")));
        })],
    );
    let suite = run_single(&mut root);
    assert_eq!(
        message_of(suite, "A failing test step").as_deref(),
        Some("\"And y = 5\" failed:\nThis fails")
    );
    assert_eq!(suite.num_failed_tests(), 1);
}

#[rstest]
fn missing_definition_fails_the_test(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A failing test step\nGiven x = 5",
        Vec::new(),
    );
    let suite = run_single(&mut root);
    assert_eq!(
        message_of(suite, "A failing test step").as_deref(),
        Some("\"Given x = 5\" does not have a matching step definition")
    );
    assert_eq!(suite.num_failed_tests(), 1);
}

#[rstest]
fn unparsable_feature_sets_the_suite_error(mut root: RootSuite) {
    get_interface(&mut root).register_cucumber("feature", "This is not a feature", Vec::new());
    let host = RecordingHost::new();
    let success = root
        .run_blocking(&host)
        .unwrap_or_else(|err| panic!("runtime should start: {err}"));
    assert!(!success);
    let report = root
        .suite("feature")
        .and_then(|s| s.report())
        .unwrap_or_else(|| panic!("the feature should have run"));
    assert_eq!(report.suite.num_tests(), 0);
    assert!(matches!(report.suite.error(), Some(RunError::Compile(_))));
    assert_eq!(host.names(), ["error"]);
}

#[rstest]
fn running_again_rebuilds_the_same_suite(mut root: RootSuite) {
    let mut interface = get_interface(&mut root);
    let suite = interface.register_cucumber(
        "feature",
        "Feature: ...\nScenario: A\nGiven x = 5\nScenario: B\nGiven y = 5",
        vec![steps(|s| {
            s.given("x = 5", |_, _| Ok(()));
        })],
    );
    let host = RecordingHost::new();
    let shape = |node: &SuiteNode| -> Vec<(String, bool)> {
        node.children()
            .iter()
            .map(|t| (t.name().to_owned(), t.has_passed()))
            .collect()
    };
    let first = suite
        .run_blocking(&host)
        .map(|r| shape(&r.suite))
        .unwrap_or_else(|err| panic!("runtime should start: {err}"));
    let second = suite
        .run_blocking(&host)
        .map(|r| shape(&r.suite))
        .unwrap_or_else(|err| panic!("runtime should start: {err}"));
    assert_eq!(first, second);
    assert_eq!(first, [("A".to_owned(), true), ("B".to_owned(), false)]);
}

#[rstest]
fn fail_fast_stops_after_the_first_failed_test() {
    let mut root: RootSuite = RootSuite::new(HarnessConfig::default().with_fail_fast(true));
    get_interface(&mut root).register_cucumber(
        "feature",
        "Feature: ...\nScenario: A\nGiven broken\nScenario: B\nGiven fine",
        vec![steps(|s| {
            s.given("broken", |_, _| Err("broken".into()))
                .given("fine", |_, _| Ok(()));
        })],
    );
    let suite = run_single(&mut root);
    assert_eq!(suite.num_tests(), 1);
    assert!(suite.test("B").is_none());
}

#[tokio::test]
async fn features_run_in_registration_order() {
    let mut root: RootSuite = RootSuite::new(HarnessConfig::default());
    let mut interface = get_interface(&mut root);
    interface.register_cucumber(
        "passing",
        "Feature: ...\nScenario: A\nGiven x = 5",
        vec![steps(|s| {
            s.given("x = 5", |_, _| Ok(()));
        })],
    );
    interface.register_cucumber(
        "failing",
        "Feature: ...\nScenario: B\nGiven y = 5",
        Vec::new(),
    );
    let host = RecordingHost::new();
    assert!(!root.run(&host).await);
    let suites: Vec<String> = host
        .events()
        .into_iter()
        .filter(|e| e.name == "suiteStart")
        .map(|e| e.subject)
        .collect();
    assert_eq!(suites, ["passing", "failing"]);
    assert!(root.suite("passing").and_then(|s| s.report()).is_some_and(|r| r.is_success()));
}
