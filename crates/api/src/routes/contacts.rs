//! Contact route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use sms_manager_core::PhoneNumber;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{Contact, NewContact};
use crate::routes::{Envelope, respond, respond_ok};
use crate::state::AppState;
use crate::validation::{
    FIRSTNAME_MESSAGE, Field, LASTNAME_MESSAGE, NUMBER_MESSAGE, Rule, Schema, Validate,
    ValidatedJson, ValidatedPath, is_person_name, is_phone_number,
};

impl Validate for NewContact {
    const SCHEMA: Schema = Schema {
        fields: &[
            Field::required("firstname", &[Rule::Pattern(is_person_name)])
                .with_message(FIRSTNAME_MESSAGE),
            Field::optional("lastname", &[Rule::Pattern(is_person_name)])
                .with_message(LASTNAME_MESSAGE),
            Field::required("number", &[Rule::Pattern(is_phone_number)])
                .with_message(NUMBER_MESSAGE),
        ],
    };
}

/// `{number}` path parameter.
#[derive(Debug, Deserialize)]
pub struct NumberPath {
    pub number: PhoneNumber,
}

impl Validate for NumberPath {
    const SCHEMA: Schema = Schema {
        fields: &[Field::required("number", &[Rule::Pattern(is_phone_number)])
            .with_message(NUMBER_MESSAGE)],
    };
}

const NOT_FOUND: &str = "Contact does not exist";

type ContactResponse<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

/// POST /v1/contacts
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ValidatedJson(contact): ValidatedJson<NewContact>,
) -> ContactResponse<Contact> {
    let (contact, created) = state.contacts().find_or_create(contact).await?;
    if !created {
        return Err(AppError::Conflict("This contact already exists".to_owned()));
    }

    info!(contact_id = %contact.id, user_id = %me.user_id, "contact created");
    Ok(respond(
        StatusCode::CREATED,
        "Contact added successfully",
        contact,
    ))
}

/// GET /v1/contacts/{number}
pub async fn fetch(
    State(state): State<AppState>,
    ValidatedPath(path): ValidatedPath<NumberPath>,
) -> ContactResponse<Contact> {
    let contact = state
        .contacts()
        .find_by_number(&path.number)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(respond(
        StatusCode::OK,
        "Contact fetched successfully",
        contact,
    ))
}

/// GET /v1/contacts
pub async fn fetch_all(State(state): State<AppState>) -> ContactResponse<Vec<Contact>> {
    let contacts = state.contacts().list().await?;
    Ok(respond(
        StatusCode::OK,
        "Contacts fetched successfully",
        contacts,
    ))
}

/// DELETE /v1/contacts/{number}
///
/// Messages the contact sent are removed with it; messages it received
/// keep a `null` receiver.
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ValidatedPath(path): ValidatedPath<NumberPath>,
) -> ContactResponse<()> {
    if !state.contacts().delete_by_number(&path.number).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    info!(number = %path.number, user_id = %me.user_id, "contact deleted");
    Ok(respond_ok("Contact deleted successfully"))
}
