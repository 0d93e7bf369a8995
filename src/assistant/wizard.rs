//! Chat wizard that walks a visitor through login or signup.
//!
//! The server keeps no session: each response carries the next state and the
//! client sends it back with the following input. Passwords never enter the
//! state.

use serde::{Deserialize, Serialize};

use crate::auth::{self, JwtKeys};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{normalize_email, normalize_name, validate_password, SignupRequest, User};

const LOGIN_WORDS: [&str; 4] = ["login", "log in", "sign in", "1"];
const SIGNUP_WORDS: [&str; 4] = ["signup", "sign up", "register", "2"];
const CANCEL_WORD: &str = "cancel";

const CHOOSE_PROMPT: &str =
    "Hi! I can help you get into the helpdesk. Type 1 to log in or 2 to sign up.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardState {
    #[default]
    Start,
    ChooseFlow,
    LoginEmail,
    LoginPassword {
        email: String,
    },
    SignupName,
    SignupEmail {
        name: String,
    },
    SignupPassword {
        name: String,
        email: String,
    },
    Done,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardRequest {
    #[serde(default)]
    pub state: WizardState,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardResponse {
    pub state: WizardState,
    pub message: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl WizardResponse {
    fn prompt(state: WizardState, message: impl Into<String>) -> Self {
        Self {
            done: state == WizardState::Done,
            state,
            message: message.into(),
            token: None,
            user: None,
        }
    }
}

/// Outcome of feeding one input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Show `message` and wait in `state`
    Prompt { state: WizardState, message: String },
    Login { email: String, password: String },
    Signup {
        name: String,
        email: String,
        password: String,
    },
}

fn prompt(state: WizardState, message: impl Into<String>) -> Transition {
    Transition::Prompt {
        state,
        message: message.into(),
    }
}

fn matches_any(input: &str, words: &[&str]) -> bool {
    words.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Pure transition function.
///
/// Passwords are taken verbatim so they match what the REST login compares;
/// every other answer is trimmed.
pub fn advance(state: WizardState, raw: &str) -> Transition {
    let input = raw.trim();

    if input.eq_ignore_ascii_case(CANCEL_WORD) {
        return prompt(WizardState::ChooseFlow, CHOOSE_PROMPT);
    }

    match state {
        WizardState::Start => prompt(WizardState::ChooseFlow, CHOOSE_PROMPT),
        WizardState::ChooseFlow => {
            if matches_any(input, &LOGIN_WORDS) {
                prompt(WizardState::LoginEmail, "What is your email address?")
            } else if matches_any(input, &SIGNUP_WORDS) {
                prompt(WizardState::SignupName, "Great! What is your name?")
            } else {
                prompt(
                    WizardState::ChooseFlow,
                    format!("Sorry, I didn't get that. {}", CHOOSE_PROMPT),
                )
            }
        }
        WizardState::LoginEmail => match normalize_email(input) {
            Ok(email) => prompt(
                WizardState::LoginPassword { email },
                "Thanks. Now enter your password.",
            ),
            Err(e) => prompt(WizardState::LoginEmail, e.message()),
        },
        WizardState::LoginPassword { email } => {
            if raw.is_empty() {
                prompt(
                    WizardState::LoginPassword { email },
                    "Please enter your password.",
                )
            } else {
                Transition::Login {
                    email,
                    password: raw.to_string(),
                }
            }
        }
        WizardState::SignupName => match normalize_name(input) {
            Ok(name) => prompt(
                WizardState::SignupEmail { name: name.clone() },
                format!("Nice to meet you, {}. What is your email address?", name),
            ),
            Err(e) => prompt(WizardState::SignupName, e.message()),
        },
        WizardState::SignupEmail { name } => match normalize_email(input) {
            Ok(email) => prompt(
                WizardState::SignupPassword { name, email },
                "Choose a password (at least 8 characters).",
            ),
            Err(e) => prompt(WizardState::SignupEmail { name }, e.message()),
        },
        WizardState::SignupPassword { name, email } => match validate_password(raw) {
            Ok(()) => Transition::Signup {
                name,
                email,
                password: raw.to_string(),
            },
            Err(e) => prompt(WizardState::SignupPassword { name, email }, e.message()),
        },
        WizardState::Done => prompt(WizardState::Done, "You are already signed in."),
    }
}

/// Advance the wizard, performing the login or signup the transition asks for.
///
/// Authentication failures keep the password step so the visitor can retry.
pub async fn step(
    repo: &Repository,
    keys: &JwtKeys,
    bcrypt_cost: u32,
    request: WizardRequest,
) -> Result<WizardResponse, AppError> {
    match advance(request.state, &request.input) {
        Transition::Prompt { state, message } => Ok(WizardResponse::prompt(state, message)),
        Transition::Login { email, password } => {
            match auth::login(repo, keys, &email, &password).await {
                Ok(session) => Ok(finished(
                    format!("Welcome back, {}!", session.user.name),
                    session.token,
                    session.user,
                )),
                Err(AppError::Unauthorized(reason)) => Ok(WizardResponse::prompt(
                    WizardState::LoginPassword { email },
                    format!("{}. Try again or type cancel.", reason),
                )),
                Err(e) => Err(e),
            }
        }
        Transition::Signup {
            name,
            email,
            password,
        } => {
            let signup = SignupRequest {
                email: email.clone(),
                password,
                name: name.clone(),
            };
            match auth::signup(repo, keys, bcrypt_cost, &signup).await {
                Ok(session) => Ok(finished(
                    format!("Your account is ready, {}!", session.user.name),
                    session.token,
                    session.user,
                )),
                Err(AppError::Conflict(reason) | AppError::Validation(reason)) => {
                    Ok(WizardResponse::prompt(
                        WizardState::SignupPassword { name, email },
                        format!("{}. Type cancel to start over.", reason),
                    ))
                }
                Err(e) => Err(e),
            }
        }
    }
}

fn finished(message: String, token: String, user: User) -> WizardResponse {
    WizardResponse {
        state: WizardState::Done,
        message,
        done: true,
        token: Some(token),
        user: Some(user),
    }
}
