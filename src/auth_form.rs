#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AuthMode {
    Login,
    #[strum(serialize = "Sign Up")]
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Confirm,
}

const LOGIN_FIELDS: &[Field] = &[Field::Email, Field::Password];
const SIGNUP_FIELDS: &[Field] = &[Field::Email, Field::Password, Field::Confirm];

/// Editable state of the sign-in screen
#[derive(Debug, Clone, PartialEq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub show_password: bool,
    pub show_confirm: bool,
    pub focus: Field,
    pub error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            password: String::new(),
            confirm: String::new(),
            show_password: false,
            show_confirm: false,
            focus: Field::Email,
            error: None,
        }
    }
}

impl AuthForm {
    pub fn fields(&self) -> &'static [Field] {
        match self.mode {
            AuthMode::Login => LOGIN_FIELDS,
            AuthMode::SignUp => SIGNUP_FIELDS,
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Confirm => &mut self.confirm,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    /// Show/hide the focused password field. No-op on the email field.
    pub fn toggle_visibility(&mut self) {
        match self.focus {
            Field::Email => {}
            Field::Password => self.show_password = !self.show_password,
            Field::Confirm => self.show_confirm = !self.show_confirm,
        }
    }

    /// Switch between Login and Sign Up; every field starts over
    pub fn toggle_mode(&mut self) {
        let mode = match self.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
        *self = Self {
            mode,
            ..Self::default()
        };
    }

    /// Logout clears credentials and errors but keeps the chosen mode
    pub fn clear(&mut self) {
        let mode = self.mode;
        *self = Self {
            mode,
            ..Self::default()
        };
    }

    /// Text to draw for `field`, masked unless revealed
    pub fn display_value(&self, field: Field) -> String {
        let (value, shown) = match field {
            Field::Email => (&self.email, true),
            Field::Password => (&self.password, self.show_password),
            Field::Confirm => (&self.confirm, self.show_confirm),
        };
        if shown {
            value.clone()
        } else {
            "•".repeat(value.chars().count())
        }
    }
}
