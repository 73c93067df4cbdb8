//! `/notifications` WebSocket endpoint.

use crate::{
    error::AppError,
    realtime::{ClientId, ClientMessage, Room, ServerEvent},
    services::auth::bearer_token,
    state::AppState,
};
use actix_web::{Error, HttpRequest, HttpResponse, get, web};
use actix_ws::{Message, Session};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

async fn send(session: &mut Session, event: &ServerEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => session.text(text).await.is_ok(),
        Err(e) => {
            log::error!("Could not encode server event: {}", e);
            true
        }
    }
}

/// Apply one client frame and build the reply for it.
pub(crate) fn handle_frame(
    state: &AppState,
    client_id: &ClientId,
    user_id: i32,
    text: &str,
) -> ServerEvent {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(_) => return ServerEvent::error("Unrecognized message"),
    };

    match message {
        ClientMessage::JoinProject { project_id } => {
            match state.projects.get(user_id, project_id) {
                Ok(_) => {
                    let room = Room::Project(project_id);
                    state.hub.join(client_id, room);
                    ServerEvent::Joined {
                        room: room.to_string(),
                    }
                }
                Err(e) => ServerEvent::error(e.to_string()),
            }
        }
        ClientMessage::LeaveProject { project_id } => {
            let room = Room::Project(project_id);
            state.hub.leave(client_id, room);
            ServerEvent::Left {
                room: room.to_string(),
            }
        }
        ClientMessage::MarkAsRead { notification_id } => {
            match state.notifications.mark_read(user_id, notification_id) {
                Ok(notification) => ServerEvent::NotificationRead(notification),
                Err(e) => ServerEvent::error(e.to_string()),
            }
        }
    }
}

#[get("/notifications")]
pub async fn notifications_socket(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<TokenQuery>,
    body: web::Payload,
) -> Result<HttpResponse, Error> {
    let token = query
        .into_inner()
        .token
        .or_else(|| bearer_token(&req))
        .ok_or_else(|| AppError::Unauthorized("No token".to_string()))?;
    let user_id = state.tokens.decode(&token)?.user_id()?;
    let backlog = state.notifications.unread(user_id)?;

    let (response, mut session, mut stream) = actix_ws::handle(&req, body)?;
    let (client_id, mut events) = state.hub.connect(user_id);
    log::info!("WebSocket client {} connected for user {}", client_id, user_id);

    actix_web::rt::spawn(async move {
        if !send(&mut session, &ServerEvent::Notifications(backlog)).await {
            state.hub.disconnect(&client_id);
            return;
        }

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    if !send(&mut session, &event).await {
                        break;
                    }
                }
                frame = stream.recv() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_frame(&state, &client_id, user_id, &text);
                        if !send(&mut session, &reply).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(reason))) => {
                        let _ = session.close(reason).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("WebSocket protocol error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }

        state.hub.disconnect(&client_id);
        log::info!("WebSocket client {} disconnected", client_id);
    });

    Ok(response)
}
