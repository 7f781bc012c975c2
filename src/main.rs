use flowmapper_rust::errors::CoreError;
use flowmapper_rust::node::{exchange, LocalNode};
use mapper_core::{FlowEventPayload, FlowKey, FlowMapperEvent, HoldingIdentity, MapperPayload, SessionEvent, SessionInit,
                  SessionPayload, StartFlowRequest};
use mapper_service::config::{init_dotenv, FlowMapperConfig};
use std::time::{Duration, Instant};

/// Demo: dos nodos locales (Alice y Bob) abren una sesión, intercambian un
/// mensaje y la cierran; los timers de limpieza borran el estado de ambos.
fn run_session_demo(base: &FlowMapperConfig) -> Result<(), CoreError> {
    let alice = HoldingIdentity::new("O=Alice, L=London, C=GB", "demo");
    let bob = HoldingIdentity::new("O=Bob, L=Paris, C=FR", "demo");
    let mut alice_node = LocalNode::start("alice", base.clone())?;
    let mut bob_node = LocalNode::start("bob", base.clone())?;

    // Inicio del flow local de Alice.
    let request_id = uuid::Uuid::new_v4().to_string();
    alice_node.submit(&request_id,
                      FlowMapperEvent::inbound(MapperPayload::StartFlow(StartFlowRequest { client_request_id: request_id.clone(),
                                                                                           flow_name: "PingFlow".into(),
                                                                                           identity: alice.clone(),
                                                                                           start_args: serde_json::json!({ "greeting": "hola" }) })));
    exchange(&mut alice_node, &mut bob_node)?;
    let flow_key: FlowKey = alice_node.require_state(&request_id)?.flow_key;
    println!("[alice] flow iniciado: {flow_key}");

    // La sesión se abre desde el flow de Alice.
    let session_id = format!("{}-session", flow_key.id);
    let init = SessionInit { flow_name: "PingFlow".into(),
                             initiating_identity: alice,
                             initiated_identity: bob,
                             flow_key: Some(flow_key),
                             payload: b"ping".to_vec() };
    alice_node.submit(&session_id,
                      FlowMapperEvent::outbound(MapperPayload::Session(SessionEvent::new(session_id.clone(),
                                                                                         1,
                                                                                         SessionPayload::Init(init)))));
    exchange(&mut alice_node, &mut bob_node)?;
    let initiated = mapper_core::to_initiated(&session_id);
    println!("[bob] sesión {initiated} -> flow {}", bob_node.require_state(&initiated)?.flow_key);

    // Respuesta de Bob.
    bob_node.submit(&initiated,
                    FlowMapperEvent::outbound(MapperPayload::Session(SessionEvent::new(initiated.clone(),
                                                                                       1,
                                                                                       SessionPayload::Data(b"pong".to_vec())))));
    exchange(&mut alice_node, &mut bob_node)?;
    for ev in alice_node.flow_events() {
        if let FlowEventPayload::Session(s) = ev.payload {
            println!("[alice] {} recibido en {} (seq {})", s.payload_name(), ev.flow_key, s.sequence_num);
        }
    }

    // Cierre en ambos lados.
    let cleanup = || FlowMapperEvent::inbound(MapperPayload::ScheduleCleanup { timeout_millis: 200 });
    alice_node.submit(&session_id, cleanup());
    alice_node.submit(&request_id, cleanup());
    bob_node.submit(&initiated, cleanup());
    exchange(&mut alice_node, &mut bob_node)?;
    println!("[demo] sesiones en CLOSING; esperando timers de limpieza");

    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline
          && (alice_node.bus().state_count() > 0 || bob_node.bus().state_count() > 0)
    {
        std::thread::sleep(Duration::from_millis(50));
        exchange(&mut alice_node, &mut bob_node)?;
    }
    println!("[demo] estados restantes: alice={} bob={}",
             alice_node.bus().state_count(),
             bob_node.bus().state_count());

    alice_node.stop()?;
    bob_node.stop()?;
    Ok(())
}

fn main() {
    init_dotenv();
    let config = match FlowMapperConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuración inválida: {e}");
            std::process::exit(2);
        }
    };
    println!("== Flow Mapper demo (grupo {}, instancia {}) ==", config.group_name, config.instance_id);
    if let Err(e) = run_session_demo(&config) {
        eprintln!("demo falló: {e}");
        std::process::exit(1);
    }
}
