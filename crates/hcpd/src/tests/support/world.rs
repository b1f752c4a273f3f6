//! Scenario world driving a live bridge from the test thread.
//!
//! The test thread owns the scene and the pump, so it plays the frame loop:
//! requests go out on a client thread and the world ticks until the reply
//! arrives.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hcp_config::ListenerEndpoint;
use hcp_scene::{ComponentSpec, ReflectionTable, Scene, SceneTree, StickyTag};
use serde_json::Value;

use crate::dispatch::{DispatchTable, ELEMENT_KEY};
use crate::jobs::{JobPump, job_queue};
use crate::session::Server;
use crate::transport::test_utils::{decode_chunked_body, parse_status, post_action};

use super::reporter::RecordingHealthReporter;

const FRAME: Duration = Duration::from_millis(1);

/// A decoded HTTP reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    /// Body decoded as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("reply body should be JSON")
    }
}

/// Blueprint used to recreate a destroyed node.
#[derive(Debug, Clone)]
struct NodeBlueprint {
    component: String,
    sticky: Option<String>,
}

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub reporter: Arc<RecordingHealthReporter>,
    scene: Scene,
    blueprints: HashMap<String, NodeBlueprint>,
    pump: JobPump,
    server: Server,
    last_address: Option<SocketAddr>,
    pub reply: Option<Reply>,
    pub found: Option<String>,
}

impl TestWorld {
    pub fn new() -> Self {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let (sender, pump) = job_queue(ReflectionTable::new());
        let pump = pump.with_reporter(reporter.clone());
        let server = Server::new(
            ListenerEndpoint::new("127.0.0.1", 0),
            DispatchTable::standard(),
            sender,
            reporter.clone(),
        );
        Self {
            reporter,
            scene: Scene::default(),
            blueprints: HashMap::new(),
            pump,
            server,
            last_address: None,
            reply: None,
            found: None,
        }
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Adds a root node carrying one unit of `component`.
    pub fn add_node(&mut self, name: &str, component: &str, sticky: Option<&str>) {
        let blueprint = NodeBlueprint {
            component: component.to_owned(),
            sticky: sticky.map(str::to_owned),
        };
        self.spawn(name, &blueprint);
        self.blueprints.insert(name.to_owned(), blueprint);
    }

    /// Destroys the root node `name` and spawns an identical replacement.
    pub fn recreate(&mut self, name: &str) {
        let node = self
            .scene
            .find_path(&format!("/{name}"))
            .expect("node to recreate should exist");
        self.scene.destroy(node).expect("destroy node");
        let blueprint = self
            .blueprints
            .get(name)
            .cloned()
            .expect("node should have a blueprint");
        self.spawn(name, &blueprint);
    }

    fn spawn(&mut self, name: &str, blueprint: &NodeBlueprint) {
        let node = self.scene.spawn(None, name).expect("spawn node");
        self.scene
            .attach(node, ComponentSpec::new(blueprint.component.clone()))
            .expect("attach component");
        if let Some(guid) = &blueprint.sticky {
            self.scene
                .set_sticky(node, StickyTag::authored(guid.clone()))
                .expect("set sticky tag");
        }
    }

    pub fn start(&mut self) -> Result<(), String> {
        self.server.start().map_err(|error| error.to_string())?;
        self.last_address = self.server.local_addr();
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), String> {
        self.server.stop().map_err(|error| error.to_string())
    }

    /// Address the listener was last bound to.
    pub fn last_address(&self) -> Option<SocketAddr> {
        self.last_address
    }

    /// Sends a raw request and ticks the pump until the reply arrives.
    pub fn send(&mut self, request: String) -> &Reply {
        let address = self.server.local_addr().expect("server should be started");
        let client = thread::spawn(move || exchange(address, &request));
        while !client.is_finished() {
            self.pump.tick(&mut self.scene);
            thread::sleep(FRAME);
        }
        let raw = client.join().expect("client thread panicked");
        self.reply.insert(Reply {
            status: parse_status(&raw),
            body: decode_chunked_body(&raw),
        })
    }

    /// Sends an action envelope.
    pub fn act(&mut self, action: &str, params: &Value) -> &Reply {
        let envelope = serde_json::json!({ "cmd": "action", "action": action, "params": params });
        self.send(post_action(&envelope.to_string()))
    }

    /// Runs a `find` and remembers the returned element id.
    pub fn find(&mut self, strategy: &str, selector: &str) {
        let params = serde_json::json!({ "strategy": strategy, "selector": selector });
        let found = self
            .act("find", &params)
            .json()
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned);
        self.found = found;
    }

    pub fn last_reply(&self) -> &Reply {
        self.reply.as_ref().expect("a request should have been sent")
    }
}

fn exchange(address: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(address).expect("connect to bridge");
    stream.write_all(request.as_bytes()).expect("send request");
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).expect("read reply");
    raw
}
