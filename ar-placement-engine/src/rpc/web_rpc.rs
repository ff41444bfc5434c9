use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::EngineSet;
use crate::engine::catalog::Catalog;
use crate::engine::scene::Placeable;
use crate::engine::surface::XrFrameEvent;
use crate::tools::placement::state::SessionSignal;
use crate::tools::placement::{PlacementCommand, PlacementSession, PlacementSignal};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure. A missing `id` makes it a notification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Resource managing bidirectional RPC communication with the host page.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host without expecting response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(EngineSet::Tracking),
            )
            .add_systems(
                Update,
                (forward_placement_signals, send_outgoing_messages)
                    .chain()
                    .after(EngineSet::Placement),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
            return;
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the host page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Everything RPC handlers read or dispatch into.
#[derive(SystemParam)]
pub struct RpcContext<'w, 's> {
    session: Res<'w, PlacementSession>,
    catalog: Res<'w, Catalog>,
    transforms: Query<'w, 's, &'static Transform, With<Placeable>>,
    commands: EventWriter<'w, PlacementCommand>,
    frames: EventWriter<'w, XrFrameEvent>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut ctx: RpcContext,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                trace!("Processing method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut ctx) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("RPC parse error: {}", parse_error);
            }
        }
    }
}

/// Dispatch one request. Notifications run the method too but get no reply.
fn handle_rpc_request(request: &RpcRequest, ctx: &mut RpcContext) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "select_item" => handle_select_item(&request.params, ctx),
        "place" => dispatch_command(PlacementCommand::Place, ctx),
        "cancel" => dispatch_command(PlacementCommand::Cancel, ctx),
        "delete" => dispatch_command(PlacementCommand::Delete, ctx),
        "xr_frame" => handle_xr_frame(&request.params, ctx),
        "get_placed_items" => Ok(placed_items_json(ctx)),
        "get_catalog" => Ok(catalog_json(&ctx.catalog)),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            Err(RpcError::method_not_found(&request.method))
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn handle_select_item(params: &Value, ctx: &mut RpcContext) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct SelectItemParams {
        template: String,
    }

    let parsed = serde_json::from_value::<SelectItemParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'template' parameter"))?;

    let available = ctx.session.has_template(&parsed.template);
    info!("Thumbnail activated over RPC: {}", parsed.template);
    ctx.commands
        .write(PlacementCommand::ThumbnailActivated(parsed.template.clone()));

    Ok(json!({
        "success": true,
        "template": parsed.template,
        "available": available
    }))
}

fn dispatch_command(command: PlacementCommand, ctx: &mut RpcContext) -> Result<Value, RpcError> {
    ctx.commands.write(command);
    Ok(json!({ "success": true }))
}

fn handle_xr_frame(params: &Value, ctx: &mut RpcContext) -> Result<Value, RpcError> {
    let frame = serde_json::from_value::<XrFrameEvent>(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("Invalid xr_frame: {e}")))?;
    ctx.frames.write(frame);
    Ok(json!({ "success": true }))
}

fn placed_items_json(ctx: &RpcContext) -> Value {
    let items: Vec<Value> = ctx
        .session
        .placed()
        .iter()
        .filter_map(|item| {
            let transform = ctx.transforms.get(item.object.entity()?).ok()?;
            let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
            Some(json!({
                "id": item.object,
                "template": item.template,
                "position": transform.translation.to_array(),
                "yaw": yaw,
                "scale": transform.scale.x,
            }))
        })
        .collect();
    json!({ "items": items })
}

fn catalog_json(catalog: &Catalog) -> Value {
    let mut categories: Vec<&str> = Vec::new();
    for item in &catalog.items {
        if !categories.contains(&item.category.as_str()) {
            categories.push(&item.category);
        }
    }
    json!({
        "categories": categories,
        "items": catalog.items,
    })
}

/// Notification method and payload for one session signal.
pub fn signal_notification(signal: &SessionSignal) -> (&'static str, Value) {
    match signal {
        SessionSignal::Status(status) => (
            "status_changed",
            json!({
                "status": status,
                "message": status.as_ref().map(ToString::to_string),
            }),
        ),
        SessionSignal::PlacementControls { visible } => {
            ("placement_controls", json!({ "visible": visible }))
        }
        SessionSignal::DeleteAffordance { anchor } => (
            "delete_affordance",
            match anchor {
                Some(at) => json!({ "visible": true, "x": at.x, "y": at.y }),
                None => json!({ "visible": false }),
            },
        ),
        SessionSignal::SelectionChanged(object) => {
            ("selection_changed", json!({ "object": object }))
        }
        SessionSignal::ItemPlaced(object) => ("item_placed", json!({ "object": object })),
        SessionSignal::ItemDeleted(object) => ("item_deleted", json!({ "object": object })),
    }
}

fn forward_placement_signals(
    mut signals: EventReader<PlacementSignal>,
    session: Res<PlacementSession>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for PlacementSignal(signal) in signals.read() {
        let (method, mut params) = signal_notification(signal);
        if let SessionSignal::ItemPlaced(object) = signal {
            if let Some(item) = session.placed().iter().find(|item| item.object == *object) {
                params["template"] = json!(item.template);
            }
        }
        rpc_interface.send_notification(method, params);
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::placement::state::{ObjectId, StatusMessage};

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<PlacementSession>()
            .init_resource::<Catalog>()
            .init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<PlacementCommand>()
            .add_event::<XrFrameEvent>()
            .add_systems(Update, handle_rpc_messages);
        app
    }

    fn send(app: &mut App, message: Value) {
        app.world_mut().send_event(IncomingRpcMessage {
            content: message.to_string(),
        });
        app.update();
    }

    fn responses(app: &mut App) -> Vec<RpcResponse> {
        app.world_mut()
            .resource_mut::<WebRpcInterface>()
            .outgoing_responses
            .drain(..)
            .collect()
    }

    fn commands(app: &mut App) -> Vec<PlacementCommand> {
        app.world_mut()
            .resource_mut::<Events<PlacementCommand>>()
            .drain()
            .collect()
    }

    #[test]
    fn select_item_dispatches_thumbnail_command() {
        let mut app = test_app();
        send(
            &mut app,
            json!({
                "jsonrpc": "2.0",
                "method": "select_item",
                "params": {"template": "chair-1"},
                "id": 1
            }),
        );

        assert_eq!(
            commands(&mut app),
            vec![PlacementCommand::ThumbnailActivated("chair-1".into())]
        );
        let responses = responses(&mut app);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, Some(json!(1)));
        assert_eq!(responses[0].result.as_ref().unwrap()["available"], json!(false));
    }

    #[test]
    fn notifications_run_without_reply() {
        let mut app = test_app();
        send(&mut app, json!({"jsonrpc": "2.0", "method": "place"}));

        assert_eq!(commands(&mut app), vec![PlacementCommand::Place]);
        assert!(responses(&mut app).is_empty());
    }

    #[test]
    fn unknown_method_and_bad_params_report_codes() {
        let mut app = test_app();
        send(&mut app, json!({"jsonrpc": "2.0", "method": "fly", "id": "a"}));
        send(
            &mut app,
            json!({"jsonrpc": "2.0", "method": "select_item", "params": {}, "id": "b"}),
        );

        let responses = responses(&mut app);
        assert_eq!(responses[0].error.as_ref().unwrap().code, -32601);
        assert_eq!(responses[1].error.as_ref().unwrap().code, -32602);
    }

    #[test]
    fn xr_frame_becomes_event() {
        let mut app = test_app();
        send(
            &mut app,
            json!({
                "jsonrpc": "2.0",
                "method": "xr_frame",
                "params": {"hit": {"position": [1.0, 0.0, -2.0]}}
            }),
        );

        let frames: Vec<XrFrameEvent> = app
            .world_mut()
            .resource_mut::<Events<XrFrameEvent>>()
            .drain()
            .collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].viewer.is_none());
        assert_eq!(frames[0].hit.unwrap().position, [1.0, 0.0, -2.0]);
    }

    #[test]
    fn signals_map_to_notifications() {
        let (method, params) =
            signal_notification(&SessionSignal::Status(Some(StatusMessage::TapPlace)));
        assert_eq!(method, "status_changed");
        assert_eq!(params["status"]["kind"], json!("tap_place"));

        let (method, params) = signal_notification(&SessionSignal::DeleteAffordance {
            anchor: Some(Vec2::new(60.0, 140.0)),
        });
        assert_eq!(method, "delete_affordance");
        assert_eq!(params, json!({"visible": true, "x": 60.0, "y": 140.0}));

        let (method, params) = signal_notification(&SessionSignal::ItemDeleted(ObjectId(9)));
        assert_eq!(method, "item_deleted");
        assert_eq!(params, json!({"object": 9}));
    }
}
