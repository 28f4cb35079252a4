//! The guestbook page: `GET /` renders the form and entry list, `POST /`
//! accepts a submission and redirects on success (redirect-after-post, so a
//! reload re-issues a GET instead of resubmitting the form).

use super::AppState;
use crate::csrf;
use crate::entry::Entry;
use crate::fingerprint;
use crate::validation::{validate, FieldLimits, SubmissionCheck, Violation};
use actix_session::Session;
use actix_web::web::Data;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use serde::Deserialize;

const FLASH_SESSION_KEY: &str = "flash";
const FLASH_SAVED: &str = "Thanks! Your entry has been saved.";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_guestbook).service(post_entry);
}

#[derive(Template)]
#[template(path = "guestbook.html")]
pub struct GuestbookTemplate {
    /// One-shot success notice, consumed from the session.
    pub flash: Option<String>,
    /// Collected violation messages; empty on a clean render.
    pub errors: Vec<String>,
    /// Prior submitted values, re-displayed after a rejected POST.
    pub name: String,
    pub message: String,
    pub csrf_token: String,
    pub entries: Vec<Entry>,
    pub max_name_len: usize,
    pub max_message_len: usize,
    pub cooldown_secs: u64,
    pub data_dir: String,
}

mod filters {
    /// Escape user text and turn newlines into `<br>` so stored messages
    /// render multi-line. Used with `|safe` since the output is pre-escaped.
    pub fn nl2br(s: &str) -> ::askama::Result<String> {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                '\n' => out.push_str("<br>"),
                '\r' => {}
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

#[derive(Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    csrf: String,
    /// Honeypot; hidden from human users via styling, must stay empty.
    #[serde(default)]
    hp_web: String,
}

#[get("/")]
pub async fn view_guestbook(
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, Error> {
    let flash = take_flash(&session);
    let csrf_token = csrf::get_or_create_csrf_token(&session)?;
    let entries = read_entries(&state).await?;

    Ok(GuestbookTemplate {
        flash,
        errors: Vec::new(),
        name: String::new(),
        message: String::new(),
        csrf_token,
        entries,
        max_name_len: state.config.limits.max_name_len,
        max_message_len: state.config.limits.max_message_len,
        cooldown_secs: state.config.limits.cooldown_secs,
        data_dir: state.config.storage.data_dir.clone(),
    }
    .to_response())
}

#[post("/")]
pub async fn post_entry(
    req: HttpRequest,
    state: Data<AppState>,
    session: Session,
    form: web::Form<EntryForm>,
) -> Result<HttpResponse, Error> {
    let name = form.name.trim().to_string();
    let message = form.message.trim().to_string();

    let ip = fingerprint::client_ip(&req);
    let rate_key = fingerprint::rate_limit_key(&ip);

    let limits = FieldLimits {
        max_name_len: state.config.limits.max_name_len,
        max_message_len: state.config.limits.max_message_len,
    };
    let check = SubmissionCheck {
        name: &name,
        message: &message,
        honeypot: form.hp_web.trim(),
        csrf_valid: csrf::csrf_token_is_valid(&session, &form.csrf),
        cooldown: state.limiter.check(&rate_key),
    };
    let mut violations = validate(&check, &limits);

    if violations.is_empty() {
        let entry = Entry::new(
            name.clone(),
            message.clone(),
            fingerprint::entry_fingerprint(&ip, &fingerprint::user_agent(&req)),
        );
        let store = state.store.clone();
        let stored = web::block(move || store.append(&entry))
            .await
            .map_err(|_| error::ErrorInternalServerError("blocking pool error"))?;

        match stored {
            Ok(()) => {
                if let Err(e) = state.limiter.stamp(&rate_key) {
                    log::warn!("could not stamp rate limit marker: {}", e);
                }
                session
                    .insert(FLASH_SESSION_KEY, FLASH_SAVED)
                    .map_err(|_| error::ErrorInternalServerError("session error"))?;
                // Redirect to the bare path; req.path() carries no query
                // string, so a reload after redirect cannot resubmit.
                return Ok(HttpResponse::SeeOther()
                    .append_header(("Location", req.path().to_owned()))
                    .finish());
            }
            Err(e) => {
                log::error!("storing entry failed: {}", e);
                violations.push(Violation::Storage {
                    data_dir: state.config.storage.data_dir.clone(),
                });
            }
        }
    }

    // Rejected: re-render the form with the submitted values intact.
    let csrf_token = csrf::get_or_create_csrf_token(&session)?;
    let entries = read_entries(&state).await?;

    Ok(GuestbookTemplate {
        flash: None,
        errors: violations.iter().map(Violation::message).collect(),
        name,
        message,
        csrf_token,
        entries,
        max_name_len: state.config.limits.max_name_len,
        max_message_len: state.config.limits.max_message_len,
        cooldown_secs: state.config.limits.cooldown_secs,
        data_dir: state.config.storage.data_dir.clone(),
    }
    .to_response())
}

/// Read and clear the one-shot flash message.
fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH_SESSION_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_SESSION_KEY);
    }
    flash
}

/// The entry list for display. A read failure renders an empty list rather
/// than failing the page; it is logged for the operator.
async fn read_entries(state: &Data<AppState>) -> Result<Vec<Entry>, Error> {
    let store = state.store.clone();
    let limit = state.config.limits.show_limit;
    let entries = web::block(move || store.read_recent(limit))
        .await
        .map_err(|_| error::ErrorInternalServerError("blocking pool error"))?;
    Ok(entries.unwrap_or_else(|e| {
        log::error!("reading entry log failed: {}", e);
        Vec::new()
    }))
}
