//! Message route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use sms_manager_core::{MessageBody, MessageId, PhoneNumber};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{MessageView, NewMessage};
use crate::routes::{Envelope, respond, respond_ok};
use crate::state::AppState;
use crate::validation::{
    Field, RECEIVER_MESSAGE, Rule, SENDER_MESSAGE, Schema, Validate, ValidatedJson,
    ValidatedPath, is_phone_number,
};

/// Create-message request body.
#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub sender: PhoneNumber,
    pub receiver: PhoneNumber,
    pub message: MessageBody,
}

impl Validate for CreateMessage {
    const SCHEMA: Schema = Schema {
        fields: &[
            Field::required("sender", &[Rule::Pattern(is_phone_number)])
                .with_message(SENDER_MESSAGE),
            Field::required("receiver", &[Rule::Pattern(is_phone_number)])
                .with_message(RECEIVER_MESSAGE),
            Field::required("message", &[Rule::MaxLength(MessageBody::MAX_CHARS)]),
        ],
    };
}

/// `{id}` path parameter.
#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: MessageId,
}

impl Validate for IdPath {
    const SCHEMA: Schema = Schema {
        fields: &[Field::required("id", &[Rule::Integer])],
    };
}

const NOT_FOUND: &str = "Message does not exist";

type MessageResponse<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

/// POST /v1/messages
///
/// Stores the message as `pending` and hands it to the delivery worker.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateMessage>,
) -> MessageResponse<MessageView> {
    let contacts = state.contacts();
    let sender = contacts.find_by_number(&req.sender).await?;
    let receiver = contacts.find_by_number(&req.receiver).await?;

    let (sender, receiver) = match (sender, receiver) {
        (Some(s), Some(r)) => (s, r),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Sender and receiver do not exist".to_owned(),
            ));
        }
        (None, Some(_)) => return Err(AppError::BadRequest("Sender does not exist".to_owned())),
        (Some(_), None) => {
            return Err(AppError::BadRequest("Receiver does not exist".to_owned()));
        }
    };

    let message = state
        .messages()
        .create(NewMessage {
            sender_id: sender.id,
            receiver_id: receiver.id,
            body: req.message,
        })
        .await?;

    state.delivery().schedule(&message);
    info!(
        message_id = %message.id,
        sender_id = %sender.id,
        receiver_id = %receiver.id,
        user_id = %me.user_id,
        "message created"
    );

    Ok(respond(
        StatusCode::CREATED,
        "Message created successfully",
        MessageView::from_created(message, sender.number, receiver.number),
    ))
}

/// GET /v1/messages/{id}
pub async fn fetch(
    State(state): State<AppState>,
    ValidatedPath(path): ValidatedPath<IdPath>,
) -> MessageResponse<MessageView> {
    let message = state
        .messages()
        .find(path.id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(respond(
        StatusCode::OK,
        "Message fetched successfully",
        message,
    ))
}

/// GET /v1/messages
pub async fn fetch_all(State(state): State<AppState>) -> MessageResponse<Vec<MessageView>> {
    let messages = state.messages().list().await?;
    Ok(respond(
        StatusCode::OK,
        "Messages fetched successfully",
        messages,
    ))
}

/// DELETE /v1/messages/{id}
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ValidatedPath(path): ValidatedPath<IdPath>,
) -> MessageResponse<()> {
    if !state.messages().delete(path.id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    info!(message_id = %path.id, user_id = %me.user_id, "message deleted");
    Ok(respond_ok("Message deleted successfully"))
}
