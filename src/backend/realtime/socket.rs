//! WebSocket channel (`GET /ws?token=<jwt>`)
//!
//! Bidirectional twin of the REST API. Clients send frames such as
//!
//! ```json
//! {"event": "createBoard", "ack": 7, "data": {"workspace_id": "...", "name": "Roadmap"}}
//! ```
//!
//! and get `{"ack": 7, "ok": true, "data": {...}}` or
//! `{"ack": 7, "ok": false, "error": {"error": "...", "status": 403}}` back.
//! Every named event runs through `hierarchy::ops`, so the socket enforces
//! exactly the same policy as REST. Broadcast events the user may see are
//! pushed as `{"event": "board.created", "payload": {...}}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::hierarchy::ops;
use crate::backend::middleware::{authenticate_token, AuthenticatedUser};
use crate::backend::realtime::audience::Audience;
use crate::backend::server::state::AppState;
use crate::shared::model::{
    AddMemberRequest, CreateBoardRequest, CreateGroupRequest, CreateItemRequest,
    CreateWorkspaceRequest, ItemKind, UpdateBoardRequest, UpdateGroupRequest, UpdateItemRequest,
    UpdateWorkspaceRequest,
};
use crate::shared::SharedError;

/// Outbound frames queued per connection
const OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: String,
}

/// Frame sent by the client
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub ack: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

/// Operation result sent back for a client frame
#[derive(Debug, Serialize)]
pub struct AckFrame {
    pub ack: Option<Value>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl AckFrame {
    fn from_result(ack: Option<Value>, result: BackendResult<Value>) -> Self {
        match result {
            Ok(data) => Self { ack, ok: true, data: Some(data), error: None },
            Err(e) => Self { ack, ok: false, data: None, error: Some(e.to_json()) },
        }
    }
}

#[derive(Deserialize)]
struct WithId<T> {
    id: Uuid,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct IdOnly {
    id: Uuid,
}

#[derive(Deserialize)]
struct InWorkspace<T> {
    workspace_id: Uuid,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct InBoard<T> {
    board_id: Uuid,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct InGroup<T> {
    group_id: Uuid,
    kind: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct ItemRef<T> {
    kind: String,
    id: Uuid,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct MemberRef {
    workspace_id: Uuid,
    user_id: Uuid,
}

#[derive(Deserialize)]
struct Nothing {}

#[derive(Deserialize)]
struct MoveBody {
    group_id: Uuid,
}

#[derive(Deserialize)]
struct AssignBody {
    #[serde(default)]
    assignee: Option<Uuid>,
}

fn parse<T: DeserializeOwned>(data: Value) -> BackendResult<T> {
    serde_json::from_value(data)
        .map_err(|e| BackendError::SharedError(SharedError::serialization(e.to_string())))
}

fn kind(segment: &str) -> BackendResult<ItemKind> {
    Ok(segment.parse::<ItemKind>()?)
}

fn reply<T: Serialize>(value: T) -> BackendResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Run one named operation on behalf of `user`
pub async fn dispatch_frame(
    state: &AppState,
    user: &AuthenticatedUser,
    event: &str,
    data: Value,
) -> BackendResult<Value> {
    match event {
        "listWorkspaces" => reply(ops::list_workspaces(state, user).await?),
        "createWorkspace" => {
            let request = parse::<CreateWorkspaceRequest>(data)?;
            reply(ops::create_workspace(state, user, request).await?)
        }
        "getWorkspace" => {
            let IdOnly { id } = parse::<IdOnly>(data)?;
            reply(ops::get_workspace(state, user, id).await?)
        }
        "updateWorkspace" => {
            let WithId { id, body } = parse::<WithId<UpdateWorkspaceRequest>>(data)?;
            reply(ops::update_workspace(state, user, id, body).await?)
        }
        "deleteWorkspace" => {
            let IdOnly { id } = parse::<IdOnly>(data)?;
            reply(ops::delete_workspace(state, user, id).await?)
        }
        "addMember" => {
            let InWorkspace { workspace_id, body } = parse::<InWorkspace<AddMemberRequest>>(data)?;
            reply(ops::add_member(state, user, workspace_id, body).await?)
        }
        "removeMember" => {
            let MemberRef { workspace_id, user_id } = parse::<MemberRef>(data)?;
            reply(ops::remove_member(state, user, workspace_id, user_id).await?)
        }
        "listBoards" => {
            let InWorkspace { workspace_id, .. } = parse::<InWorkspace<Nothing>>(data)?;
            reply(ops::list_boards(state, user, workspace_id).await?)
        }
        "createBoard" => {
            let InWorkspace { workspace_id, body } = parse::<InWorkspace<CreateBoardRequest>>(data)?;
            reply(ops::create_board(state, user, workspace_id, body).await?)
        }
        "getBoard" => {
            let IdOnly { id } = parse::<IdOnly>(data)?;
            reply(ops::get_board(state, user, id).await?)
        }
        "updateBoard" => {
            let WithId { id, body } = parse::<WithId<UpdateBoardRequest>>(data)?;
            reply(ops::update_board(state, user, id, body).await?)
        }
        "deleteBoard" => {
            let IdOnly { id } = parse::<IdOnly>(data)?;
            reply(ops::delete_board(state, user, id).await?)
        }
        "listGroups" => {
            let InBoard { board_id, .. } = parse::<InBoard<Nothing>>(data)?;
            reply(ops::list_groups(state, user, board_id).await?)
        }
        "createGroup" => {
            let InBoard { board_id, body } = parse::<InBoard<CreateGroupRequest>>(data)?;
            reply(ops::create_group(state, user, board_id, body).await?)
        }
        "updateGroup" => {
            let WithId { id, body } = parse::<WithId<UpdateGroupRequest>>(data)?;
            reply(ops::update_group(state, user, id, body).await?)
        }
        "deleteGroup" => {
            let IdOnly { id } = parse::<IdOnly>(data)?;
            reply(ops::delete_group(state, user, id).await?)
        }
        "listItems" => {
            let InGroup { group_id, kind: k, .. } = parse::<InGroup<Nothing>>(data)?;
            reply(ops::list_items(state, user, group_id, kind(&k)?).await?)
        }
        "createItem" => {
            let InGroup { group_id, kind: k, body } = parse::<InGroup<CreateItemRequest>>(data)?;
            reply(ops::create_item(state, user, group_id, kind(&k)?, body).await?)
        }
        "updateItem" => {
            let ItemRef { kind: k, id, body } = parse::<ItemRef<UpdateItemRequest>>(data)?;
            reply(ops::update_item(state, user, kind(&k)?, id, body).await?)
        }
        "deleteItem" => {
            let ItemRef { kind: k, id, .. } = parse::<ItemRef<Nothing>>(data)?;
            reply(ops::delete_item(state, user, kind(&k)?, id).await?)
        }
        "moveItem" => {
            let ItemRef { kind: k, id, body } = parse::<ItemRef<MoveBody>>(data)?;
            reply(ops::move_item(state, user, kind(&k)?, id, body.group_id).await?)
        }
        "assignItem" => {
            let ItemRef { kind: k, id, body } = parse::<ItemRef<AssignBody>>(data)?;
            reply(ops::assign_item(state, user, kind(&k)?, id, body.assignee).await?)
        }
        other => Err(BackendError::SharedError(SharedError::unknown("event", other))),
    }
}

/// WebSocket upgrade handler
///
/// The token is checked before upgrading, so a bad token gets a plain 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<SocketQuery>,
) -> BackendResult<Response> {
    let user = authenticate_token(&state, &query.token).await?;
    let audience = Audience::load(state.store.as_ref(), user.user_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user, audience)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: AuthenticatedUser, mut audience: Audience) {
    tracing::info!("[Socket] {} connected", user.user_id);
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);

    // Single writer: acks and forwarded events share the sink
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbox_rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut events = state.realtime_broadcast.subscribe();
    let forward = outbox.clone();
    let mut forward_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if !audience.admits(&event) {
                        continue;
                    }
                    let frame = json!({ "event": event.name(), "payload": event.payload });
                    if forward.send(frame.to_string()).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Socket] {} lagged, skipped {} events", audience.user_id(), skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let recv_user = user.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let ack = match serde_json::from_str::<ClientFrame>(text.as_str()) {
                Ok(frame) => {
                    tracing::debug!("[Socket] {} -> {}", recv_user.user_id, frame.event);
                    let result = dispatch_frame(&state, &recv_user, &frame.event, frame.data).await;
                    AckFrame::from_result(frame.ack, result)
                }
                Err(e) => AckFrame::from_result(
                    None,
                    Err(BackendError::SharedError(SharedError::serialization(e.to_string()))),
                ),
            };
            let Ok(text) = serde_json::to_string(&ack) else {
                continue;
            };
            if outbox.send(text).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            forward_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            forward_task.abort();
        }
        _ = (&mut forward_task) => {
            recv_task.abort();
            send_task.abort();
        }
    }
    tracing::info!("[Socket] {} disconnected", user.user_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_defaults() {
        let frame: ClientFrame = serde_json::from_str(r#"{"event":"listWorkspaces"}"#).unwrap();
        assert_eq!(frame.event, "listWorkspaces");
        assert!(frame.ack.is_none());
        assert!(frame.data.is_null());
    }

    #[test]
    fn test_ack_frame_shapes() {
        let ok = serde_json::to_value(AckFrame::from_result(Some(json!(1)), Ok(json!({"id": 1})))).unwrap();
        assert_eq!(ok, json!({"ack": 1, "ok": true, "data": {"id": 1}}));

        let err = AckFrame::from_result(Some(json!("a")), Err(BackendError::forbidden("nope")));
        let err = serde_json::to_value(err).unwrap();
        assert_eq!(err["ok"], false);
        assert_eq!(err["error"]["status"], 403);
        assert!(err.get("data").is_none());
    }

    #[test]
    fn test_item_ref_flattens_body() {
        let id = Uuid::new_v4();
        let group = Uuid::new_v4();
        let parsed: ItemRef<MoveBody> =
            parse(json!({"kind": "bugs", "id": id, "group_id": group})).unwrap();
        assert_eq!(parsed.id, id);
        assert_eq!(parsed.body.group_id, group);
        assert_eq!(kind(&parsed.kind).unwrap(), ItemKind::Bug);
    }
}
