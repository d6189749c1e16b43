//! Signup Form
//!
//! State of the registration screen: five text fields, keyboard focus, the
//! in-flight flag, and the blocking alert shown when the service answers.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use nutri_chat_core::registration::alert_for;
use nutri_chat_core::{Registration, RegistrationError, RegistrationOutcome};

/// Form fields, in focus order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// First name
    FirstName,
    /// Last name
    LastName,
    /// Email address
    Email,
    /// Password
    Password,
    /// Password again
    ConfirmPassword,
}

impl Field {
    /// Every field, in focus order
    pub const ALL: [Field; 5] = [
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Password,
        Field::ConfirmPassword,
    ];

    /// Label shown next to the input
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Email => "Email",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
        }
    }

    /// Whether input is masked
    #[must_use]
    pub fn is_secret(self) -> bool {
        matches!(self, Field::Password | Field::ConfirmPassword)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Blocking message over the form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    /// Text to show
    pub text: String,
    /// Whether dismissing it moves on to the chat screen
    pub proceed: bool,
}

/// What the app should do after a key press on the form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignupAction {
    /// Nothing beyond redrawing
    None,
    /// Send this registration to the service
    Submit(Registration),
    /// Switch to the chat screen
    EnterChat,
    /// Leave the program
    Quit,
}

/// Registration screen state
#[derive(Clone, Debug, Default)]
pub struct SignupForm {
    values: [String; 5],
    focus: usize,
    busy: bool,
    alert: Option<Alert>,
}

impl SignupForm {
    /// Empty form with focus on the first field
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Field with keyboard focus
    #[must_use]
    pub fn focus(&self) -> Field {
        Field::ALL[self.focus]
    }

    /// Raw value of a field
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Value as drawn, with secrets masked
    #[must_use]
    pub fn display_value(&self, field: Field) -> String {
        let value = self.value(field);
        if field.is_secret() {
            "•".repeat(value.chars().count())
        } else {
            value.to_string()
        }
    }

    /// Whether a registration is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Alert currently shown, if any
    #[must_use]
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// The form as a registration request
    #[must_use]
    pub fn registration(&self) -> Registration {
        let [first_name, last_name, email, password, confirm_password] = self.values.clone();
        Registration {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        }
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> SignupAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return SignupAction::Quit;
        }

        if let Some(alert) = &self.alert {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    let proceed = alert.proceed;
                    self.alert = None;
                    if proceed {
                        SignupAction::EnterChat
                    } else {
                        SignupAction::None
                    }
                }
                _ => SignupAction::None,
            };
        }

        if key.code == KeyCode::Esc {
            return SignupAction::Quit;
        }

        if self.busy {
            return SignupAction::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % Field::ALL.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + Field::ALL.len() - 1) % Field::ALL.len();
            }
            KeyCode::Enter => return self.submit(),
            KeyCode::Backspace => {
                self.values[self.focus].pop();
            }
            KeyCode::Char(c) => self.values[self.focus].push(c),
            _ => {}
        }

        SignupAction::None
    }

    /// Submit if every field is filled in
    fn submit(&mut self) -> SignupAction {
        let registration = self.registration();
        if !registration.is_complete() {
            tracing::debug!("Ignoring incomplete signup form");
            return SignupAction::None;
        }
        self.busy = true;
        SignupAction::Submit(registration)
    }

    /// Apply the result of a registration call
    pub fn finish(&mut self, result: &Result<RegistrationOutcome, RegistrationError>) {
        self.busy = false;
        self.alert = Some(Alert {
            text: alert_for(result),
            proceed: result.as_ref().is_ok_and(RegistrationOutcome::proceeds_to_chat),
        });
    }
}
