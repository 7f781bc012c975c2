use chrono::{Duration, TimeZone, Utc};
use mapper_core::{FixedClock, FlowEventPayload, FlowKey, FlowMapperEvent, FlowMapperMessageProcessor, FlowMapperState,
                  FlowMapperStateType, HoldingIdentity, MapperError, MapperLogger, MapperPayload, MapperTopics, RecordKey,
                  SessionEvent, SessionInit, SessionPayload, StartFlowRequest, StateAndEventProcessor};
use std::sync::Arc;

fn alice() -> HoldingIdentity {
    HoldingIdentity::new("O=Alice, L=London, C=GB", "group1")
}

fn bob() -> HoldingIdentity {
    HoldingIdentity::new("O=Bob, L=Paris, C=FR", "group1")
}

fn processor_at(clock: Arc<FixedClock>) -> FlowMapperMessageProcessor {
    FlowMapperMessageProcessor::new(MapperTopics::default(), clock, MapperLogger::global("mapper.test"))
}

fn processor() -> FlowMapperMessageProcessor {
    processor_at(Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())))
}

fn open_state() -> FlowMapperState {
    FlowMapperState::open(FlowKey::new("flow-1", alice()))
}

fn session_init(flow_key: Option<FlowKey>) -> SessionInit {
    SessionInit { flow_name: "PingFlow".into(),
                  initiating_identity: alice(),
                  initiated_identity: bob(),
                  flow_key,
                  payload: b"hello".to_vec() }
}

fn data_event(session_id: &str) -> SessionEvent {
    SessionEvent::new(session_id, 2, SessionPayload::Data(b"ping".to_vec()))
}

#[test]
fn start_flow_allocates_flow_key_and_emits_one_flow_event() {
    let p = processor();
    let request = StartFlowRequest { client_request_id: "key1".into(),
                                     flow_name: "PingFlow".into(),
                                     identity: alice(),
                                     start_args: serde_json::json!({"n": 1}) };
    let resp = p.on_next("key1", None, FlowMapperEvent::inbound(MapperPayload::StartFlow(request.clone())))
                .expect("start flow");

    assert_eq!(resp.response_events.len(), 1);
    let record = &resp.response_events[0];
    assert_eq!(record.topic, MapperTopics::default().flow_event_topic);
    let out_key = record.key.as_flow().expect("key must be a flow key").clone();
    let state = resp.updated_state.expect("state created");
    assert_eq!(state.flow_key, out_key);
    assert_eq!(state.status, FlowMapperStateType::Open);
    assert_eq!(state.expiry_time, None);
    let flow_event = record.flow_event().expect("flow event value");
    assert_eq!(flow_event.payload, FlowEventPayload::StartFlow(request));
}

#[test]
fn start_flow_replay_allocates_the_same_flow_key() {
    let p = processor();
    let request = StartFlowRequest { client_request_id: "key1".into(),
                                     flow_name: "PingFlow".into(),
                                     identity: alice(),
                                     start_args: serde_json::Value::Null };
    let ev = FlowMapperEvent::inbound(MapperPayload::StartFlow(request));
    let a = p.on_next("key1", None, ev.clone()).expect("first");
    let b = p.on_next("key1", None, ev).expect("replay");
    assert_eq!(a, b);
}

#[test]
fn duplicate_start_flow_is_ignored() {
    let p = processor();
    let request = StartFlowRequest { client_request_id: "key1".into(),
                                     flow_name: "PingFlow".into(),
                                     identity: alice(),
                                     start_args: serde_json::Value::Null };
    let resp = p.on_next("key1", Some(open_state()), FlowMapperEvent::inbound(MapperPayload::StartFlow(request)))
                .expect("duplicate tolerated");
    assert!(resp.response_events.is_empty());
    assert_eq!(resp.updated_state, Some(open_state()));
}

#[test]
fn schedule_cleanup_moves_open_to_closing_with_expiry() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let p = processor_at(Arc::new(FixedClock::new(now)));
    let resp = p.on_next("sessionId",
                         Some(open_state()),
                         FlowMapperEvent::inbound(MapperPayload::ScheduleCleanup { timeout_millis: 30_000 }))
                .expect("schedule cleanup");
    assert!(resp.response_events.is_empty());
    let state = resp.updated_state.expect("state kept");
    assert_eq!(state.status, FlowMapperStateType::Closing);
    assert_eq!(state.expiry_time, Some(now + Duration::milliseconds(30_000)));
}

#[test]
fn schedule_cleanup_keeps_existing_expiry_when_already_closing() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let closing = open_state().closing(now);
    let p = processor();
    let resp = p.on_next("sessionId",
                         Some(closing.clone()),
                         FlowMapperEvent::inbound(MapperPayload::ScheduleCleanup { timeout_millis: 99 }))
                .expect("idempotent");
    assert_eq!(resp.updated_state, Some(closing));
}

#[test]
fn schedule_cleanup_without_state_is_unexpected() {
    let err = processor().on_next("sessionId", None, FlowMapperEvent::inbound(MapperPayload::ScheduleCleanup { timeout_millis: 1 }))
                         .unwrap_err();
    assert!(matches!(err, MapperError::UnexpectedEvent { ref key, .. } if key == "sessionId"));
}

#[test]
fn execute_cleanup_deletes_state() {
    let resp = processor().on_next("sessionId", Some(open_state()), FlowMapperEvent::execute_cleanup())
                          .expect("cleanup");
    assert!(resp.response_events.is_empty());
    assert!(resp.updated_state.is_none());

    let again = processor().on_next("sessionId", None, FlowMapperEvent::execute_cleanup())
                           .expect("cleanup on absent state is a no-op");
    assert!(again.updated_state.is_none());
}

#[test]
fn outbound_session_init_relays_to_initiated_key() {
    let fk = FlowKey::new("flow-1", alice());
    let event = SessionEvent::new("sessionId", 1, SessionPayload::Init(session_init(Some(fk.clone()))));
    let resp = processor().on_next("sessionId", None, FlowMapperEvent::outbound(MapperPayload::Session(event)))
                          .expect("outbound init");

    assert_eq!(resp.updated_state.expect("state").flow_key, fk);
    assert_eq!(resp.response_events.len(), 1);
    let record = &resp.response_events[0];
    assert_eq!(record.key, RecordKey::Session("sessionId-INITIATED".into()));
    assert_eq!(record.topic, MapperTopics::default().p2p_out_topic);
    let relayed = record.mapper_event().expect("mapper event value");
    match &relayed.payload {
        MapperPayload::Session(ev) => {
            assert_eq!(ev.session_id, "sessionId-INITIATED");
            match &ev.payload {
                SessionPayload::Init(init) => {
                    assert_eq!(init.flow_key, None);
                    assert_eq!(init.payload, b"hello".to_vec());
                }
                other => panic!("expected SessionInit, got {other:?}"),
            }
        }
        other => panic!("expected session payload, got {other:?}"),
    }
}

#[test]
fn outbound_session_init_without_flow_key_fails_fast() {
    let event = SessionEvent::new("sessionId", 1, SessionPayload::Init(session_init(None)));
    let err = processor().on_next("sessionId", None, FlowMapperEvent::outbound(MapperPayload::Session(event)))
                         .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn inbound_session_init_allocates_responder_flow() {
    let event = SessionEvent::new("sessionId-INITIATED", 1, SessionPayload::Init(session_init(None)));
    let resp = processor().on_next("sessionId-INITIATED",
                                   None,
                                   FlowMapperEvent::inbound(MapperPayload::Session(event.clone())))
                          .expect("inbound init");
    let state = resp.updated_state.expect("state");
    assert_eq!(state.flow_key.identity, bob());
    assert_eq!(resp.response_events.len(), 1);
    let record = &resp.response_events[0];
    assert_eq!(record.key, RecordKey::Flow(state.flow_key.clone()));
    assert_eq!(record.flow_event().expect("flow event").payload, FlowEventPayload::Session(event));
}

#[test]
fn session_data_routes_in_both_directions() {
    let p = processor();
    let out = p.on_next("sessionId",
                        Some(open_state()),
                        FlowMapperEvent::outbound(MapperPayload::Session(data_event("sessionId"))))
               .expect("outbound data");
    assert_eq!(out.response_events.len(), 1);
    assert_eq!(out.response_events[0].key, RecordKey::Session("sessionId-INITIATED".into()));
    assert_eq!(out.updated_state, Some(open_state()));

    let responder = FlowMapperState::open(FlowKey::new("flow-2", bob()));
    let inbound = p.on_next("sessionId-INITIATED",
                            Some(responder.clone()),
                            FlowMapperEvent::inbound(MapperPayload::Session(data_event("sessionId-INITIATED"))))
                   .expect("inbound data");
    assert_eq!(inbound.response_events.len(), 1);
    assert_eq!(inbound.response_events[0].key, RecordKey::Flow(responder.flow_key));
}

#[test]
fn outbound_data_from_initiated_side_strips_suffix() {
    let responder = FlowMapperState::open(FlowKey::new("flow-2", bob()));
    let resp = processor().on_next("sessionId-INITIATED",
                                   Some(responder),
                                   FlowMapperEvent::outbound(MapperPayload::Session(data_event("sessionId-INITIATED"))))
                          .expect("reply");
    assert_eq!(resp.response_events[0].key, RecordKey::Session("sessionId".into()));
}

#[test]
fn session_data_without_state_is_unexpected() {
    let err = processor().on_next("sessionId", None, FlowMapperEvent::inbound(MapperPayload::Session(data_event("sessionId"))))
                         .unwrap_err();
    assert!(matches!(err, MapperError::UnexpectedEvent { .. }));
}

#[test]
fn session_data_against_closing_state_is_dropped() {
    let closing = open_state().closing(Utc::now());
    let resp = processor().on_next("sessionId",
                                   Some(closing.clone()),
                                   FlowMapperEvent::inbound(MapperPayload::Session(data_event("sessionId"))))
                          .expect("dropped");
    assert!(resp.response_events.is_empty());
    assert_eq!(resp.updated_state, Some(closing));
}

#[test]
fn session_error_is_routed_and_suspends_routing() {
    let p = processor();
    let err_event = SessionEvent::new("sessionId", 3, SessionPayload::Error("boom".into()));
    let resp = p.on_next("sessionId", Some(open_state()), FlowMapperEvent::inbound(MapperPayload::Session(err_event)))
                .expect("error routed");
    assert_eq!(resp.response_events.len(), 1);
    let errored = resp.updated_state.expect("state");
    assert_eq!(errored.status, FlowMapperStateType::Error);

    let after = p.on_next("sessionId", Some(errored.clone()), FlowMapperEvent::inbound(MapperPayload::Session(data_event("sessionId"))))
                 .expect("dropped");
    assert!(after.response_events.is_empty());

    let cleanup = p.on_next("sessionId", Some(errored), FlowMapperEvent::inbound(MapperPayload::ScheduleCleanup { timeout_millis: 10 }))
                   .expect("errored sessions can still be cleaned up");
    assert_eq!(cleanup.updated_state.expect("state").status, FlowMapperStateType::Closing);
}

#[test]
fn undecodable_bytes_are_unknown_payload() {
    let err = processor().on_next_bytes("sessionId", None, b"{not json").unwrap_err();
    assert!(matches!(err, MapperError::UnknownPayload(_)));
}

#[test]
fn encoded_events_are_processed() {
    let bytes = mapper_core::wire::encode_event(&FlowMapperEvent::execute_cleanup()).expect("encode");
    let resp = processor().on_next_bytes("sessionId", Some(open_state()), &bytes).expect("decoded");
    assert!(resp.updated_state.is_none());
}
