//! Per-kind token records: field definitions, wire attribute mapping,
//! and the validation rules each kind enforces on encode and decode.

use crate::error::{err, ErrorKind, Result};
use crate::kind::TokenKind;
use crate::rules::{
    attr_bytes, find_bytes, find_str, find_time, find_uint, require_bytes, require_enum,
    require_str, require_time, require_uint, AttrValue,
};

/// Whether a record is being checked before encoding (no clock
/// available, no expiration check) or after decoding (expiration is
/// checked against the caller's clock).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Encode,
    Decode,
}

/// Checks `expiration`: it is a required field in both modes (a zero
/// value is `Corrupt`, matching `CHECK_EXP`'s unconditional `CHECK_NUM`),
/// and on decode it additionally must not be in the past.
fn check_expiration(expiration: u64, now: u64, mode: Mode) -> Result<()> {
    if expiration == 0 {
        return Err(err!(ErrorKind::Corrupt, "missing expiration"));
    }
    if mode == Mode::Decode && expiration < now {
        return Err(err!(ErrorKind::TokenExpired, "expired at {expiration}, now {now}"));
    }
    Ok(())
}

macro_rules! token_kinds {
    ($($variant:ident($record:ident)),+ $(,)?) => {
        /// A decoded, validated token of any kind.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Token {
            $($variant($record),)+
        }

        impl Token {
            pub fn kind(&self) -> TokenKind {
                match self {
                    $(Token::$variant(_) => TokenKind::$variant,)+
                }
            }
        }
    };
}

token_kinds!(
    App(AppToken),
    Cred(CredToken),
    Error(ErrorToken),
    Id(IdToken),
    Login(LoginToken),
    Proxy(ProxyToken),
    Request(RequestToken),
    WebkdcFactor(WebkdcFactorToken),
    WebkdcProxy(WebkdcProxyToken),
    WebkdcService(WebkdcServiceToken),
);

impl Token {
    pub(crate) fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let fields = match self {
            Token::App(t) => t.to_attrs(),
            Token::Cred(t) => t.to_attrs(),
            Token::Error(t) => t.to_attrs(),
            Token::Id(t) => t.to_attrs(),
            Token::Login(t) => t.to_attrs(),
            Token::Proxy(t) => t.to_attrs(),
            Token::Request(t) => t.to_attrs(),
            Token::WebkdcFactor(t) => t.to_attrs(),
            Token::WebkdcProxy(t) => t.to_attrs(),
            Token::WebkdcService(t) => t.to_attrs(),
        };
        let mut out = vec![("t".to_string(), self.kind().wire_name().as_bytes().to_vec())];
        out.extend(fields);
        out
    }

    pub(crate) fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        match self {
            Token::App(t) => t.validate(mode, now),
            Token::Cred(t) => t.validate(mode, now),
            Token::Error(t) => t.validate(mode, now),
            Token::Id(t) => t.validate(mode, now),
            Token::Login(t) => t.validate(mode, now),
            Token::Proxy(t) => t.validate(mode, now),
            Token::Request(t) => t.validate(mode, now),
            Token::WebkdcFactor(t) => t.validate(mode, now),
            Token::WebkdcProxy(t) => t.validate(mode, now),
            Token::WebkdcService(t) => t.validate(mode, now),
        }
    }

    pub(crate) fn from_attrs(kind: TokenKind, attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(match kind {
            TokenKind::App => Token::App(AppToken::from_attrs(attrs)?),
            TokenKind::Cred => Token::Cred(CredToken::from_attrs(attrs)?),
            TokenKind::Error => Token::Error(ErrorToken::from_attrs(attrs)?),
            TokenKind::Id => Token::Id(IdToken::from_attrs(attrs)?),
            TokenKind::Login => Token::Login(LoginToken::from_attrs(attrs)?),
            TokenKind::Proxy => Token::Proxy(ProxyToken::from_attrs(attrs)?),
            TokenKind::Request => Token::Request(RequestToken::from_attrs(attrs)?),
            TokenKind::WebkdcFactor => Token::WebkdcFactor(WebkdcFactorToken::from_attrs(attrs)?),
            TokenKind::WebkdcProxy => Token::WebkdcProxy(WebkdcProxyToken::from_attrs(attrs)?),
            TokenKind::WebkdcService => {
                Token::WebkdcService(WebkdcServiceToken::from_attrs(attrs)?)
            }
            TokenKind::Any | TokenKind::Unknown => {
                unreachable!("caller must resolve a concrete kind before from_attrs")
            }
        })
    }
}

/// Proof of a completed login, handed to an application as a session
/// credential.
#[derive(Clone, Debug, PartialEq)]
pub struct AppToken {
    pub expiration: u64,
    pub session_key: Option<Vec<u8>>,
    pub subject: Option<String>,
    pub authz_subject: Option<String>,
    pub last_used: u64,
    pub initial_factors: Option<String>,
    pub session_factors: Option<String>,
    pub loa: u32,
}

impl AppToken {
    /// Construct and validate an app token. `expiration` must be
    /// nonzero; only the "already past" check is decode-only. Every
    /// other §4.4.1 constraint is enforced immediately, so a caller
    /// never builds a structurally invalid token by accident.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        expiration: u64,
        session_key: Option<Vec<u8>>,
        subject: Option<String>,
        authz_subject: Option<String>,
        last_used: u64,
        initial_factors: Option<String>,
        session_factors: Option<String>,
        loa: u32,
    ) -> Result<Self> {
        let t = Self {
            expiration,
            session_key,
            subject,
            authz_subject,
            last_used,
            initial_factors,
            session_factors,
            loa,
        };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = vec![("exp".into(), attr_bytes(AttrValue::Time(self.expiration)))];
        if let Some(v) = &self.session_key {
            out.push(("sk".into(), attr_bytes(AttrValue::Bytes(v))));
        }
        if let Some(v) = &self.subject {
            out.push(("sub".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.authz_subject {
            out.push(("asub".into(), attr_bytes(AttrValue::Str(v))));
        }
        if self.last_used != 0 {
            out.push(("lu".into(), attr_bytes(AttrValue::Time(self.last_used))));
        }
        if let Some(v) = &self.initial_factors {
            out.push(("if".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.session_factors {
            out.push(("sf".into(), attr_bytes(AttrValue::Str(v))));
        }
        if self.loa != 0 {
            out.push(("loa".into(), attr_bytes(AttrValue::UInt(self.loa))));
        }
        out
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            expiration: require_time(attrs, "exp")?,
            session_key: find_bytes(attrs, "sk"),
            subject: find_str(attrs, "sub")?,
            authz_subject: find_str(attrs, "asub")?,
            last_used: find_time(attrs, "lu")?,
            initial_factors: find_str(attrs, "if")?,
            session_factors: find_str(attrs, "sf")?,
            loa: find_uint(attrs, "loa")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        check_expiration(self.expiration, now, mode)?;
        if self.session_key.is_none() {
            if self.subject.is_none() {
                return Err(err!(ErrorKind::Corrupt, "missing subject in app token"));
            }
        } else {
            if self.subject.is_some() {
                return Err(err!(ErrorKind::Corrupt, "subject not valid with session key in app token"));
            }
            if self.authz_subject.is_some() {
                return Err(err!(
                    ErrorKind::Corrupt,
                    "authz_subject not valid with session key in app token"
                ));
            }
            if self.last_used != 0 {
                return Err(err!(ErrorKind::Corrupt, "last_used not valid with session key in app token"));
            }
            if self.initial_factors.is_some() {
                return Err(err!(
                    ErrorKind::Corrupt,
                    "initial_factors not valid with session key in app token"
                ));
            }
            if self.session_factors.is_some() {
                return Err(err!(
                    ErrorKind::Corrupt,
                    "session_factors not valid with session key in app token"
                ));
            }
            if self.loa != 0 {
                return Err(err!(ErrorKind::Corrupt, "loa not valid with session key in app token"));
            }
        }
        Ok(())
    }
}

/// A credential usable to obtain a third-party service ticket.
#[derive(Clone, Debug, PartialEq)]
pub struct CredToken {
    pub subject: String,
    pub cred_type: String,
    pub service: String,
    pub data: Vec<u8>,
    pub expiration: u64,
}

impl CredToken {
    pub fn new(subject: String, cred_type: String, service: String, data: Vec<u8>, expiration: u64) -> Result<Self> {
        let t = Self { subject, cred_type, service, data, expiration };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            ("sub".into(), attr_bytes(AttrValue::Str(&self.subject))),
            ("type".into(), attr_bytes(AttrValue::Str(&self.cred_type))),
            ("svc".into(), attr_bytes(AttrValue::Str(&self.service))),
            ("data".into(), attr_bytes(AttrValue::Bytes(&self.data))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ]
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            subject: require_str(attrs, "sub")?,
            cred_type: require_str(attrs, "type")?,
            service: require_str(attrs, "svc")?,
            data: require_bytes(attrs, "data")?,
            expiration: require_time(attrs, "exp")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        require_enum(&self.cred_type, "type", &["krb5"])?;
        check_expiration(self.expiration, now, mode)
    }
}

/// Carries a failure back to a party that requested a token operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorToken {
    pub code: u32,
    pub message: String,
}

impl ErrorToken {
    pub fn new(code: u32, message: String) -> Result<Self> {
        let t = Self { code, message };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            ("code".into(), attr_bytes(AttrValue::UInt(self.code))),
            ("msg".into(), attr_bytes(AttrValue::Str(&self.message))),
        ]
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            code: require_uint(attrs, "code")?,
            message: require_str(attrs, "msg")?,
        })
    }

    fn validate(&self, _mode: Mode, _now: u64) -> Result<()> {
        if self.code == 0 {
            return Err(err!(ErrorKind::Corrupt, "missing code in error token"));
        }
        Ok(())
    }
}

/// Identifies the subject after a completed authentication exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct IdToken {
    pub auth: String,
    pub expiration: u64,
    pub subject: Option<String>,
    pub auth_data: Option<Vec<u8>>,
}

impl IdToken {
    pub fn new(auth: String, expiration: u64, subject: Option<String>, auth_data: Option<Vec<u8>>) -> Result<Self> {
        let t = Self { auth, expiration, subject, auth_data };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = vec![
            ("auth".into(), attr_bytes(AttrValue::Str(&self.auth))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ];
        if let Some(v) = &self.subject {
            out.push(("sub".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.auth_data {
            out.push(("adata".into(), attr_bytes(AttrValue::Bytes(v))));
        }
        out
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            auth: require_str(attrs, "auth")?,
            expiration: require_time(attrs, "exp")?,
            subject: find_str(attrs, "sub")?,
            auth_data: find_bytes(attrs, "adata"),
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        require_enum(&self.auth, "auth", &["krb5", "webkdc"])?;
        check_expiration(self.expiration, now, mode)
    }
}

/// A one-shot username/password or one-time-password login attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginToken {
    pub username: String,
    pub password: Option<String>,
    pub otp: Option<String>,
    pub otp_type: Option<String>,
}

impl LoginToken {
    pub fn new(
        username: String,
        password: Option<String>,
        otp: Option<String>,
        otp_type: Option<String>,
    ) -> Result<Self> {
        let t = Self { username, password, otp, otp_type };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = vec![("user".into(), attr_bytes(AttrValue::Str(&self.username)))];
        if let Some(v) = &self.password {
            out.push(("pass".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.otp {
            out.push(("otp".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.otp_type {
            out.push(("otype".into(), attr_bytes(AttrValue::Str(v))));
        }
        out
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            username: require_str(attrs, "user")?,
            password: find_str(attrs, "pass")?,
            otp: find_str(attrs, "otp")?,
            otp_type: find_str(attrs, "otype")?,
        })
    }

    fn validate(&self, _mode: Mode, _now: u64) -> Result<()> {
        if self.password.is_some() && self.otp.is_some() {
            return Err(err!(
                ErrorKind::Corrupt,
                "login token cannot carry both a password and an OTP"
            ));
        }
        if self.password.is_none() && self.otp.is_none() {
            return Err(err!(
                ErrorKind::Corrupt,
                "login token needs either a password or an OTP"
            ));
        }
        Ok(())
    }
}

/// A proxy credential the WebKDC can use on the subject's behalf.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyToken {
    pub subject: String,
    pub proxy_type: String,
    pub webkdc_proxy: Vec<u8>,
    pub expiration: u64,
}

impl ProxyToken {
    pub fn new(subject: String, proxy_type: String, webkdc_proxy: Vec<u8>, expiration: u64) -> Result<Self> {
        let t = Self { subject, proxy_type, webkdc_proxy, expiration };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            ("sub".into(), attr_bytes(AttrValue::Str(&self.subject))),
            ("ptype".into(), attr_bytes(AttrValue::Str(&self.proxy_type))),
            ("wkproxy".into(), attr_bytes(AttrValue::Bytes(&self.webkdc_proxy))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ]
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            subject: require_str(attrs, "sub")?,
            proxy_type: require_str(attrs, "ptype")?,
            webkdc_proxy: require_bytes(attrs, "wkproxy")?,
            expiration: require_time(attrs, "exp")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        require_enum(&self.proxy_type, "ptype", &["krb5"])?;
        check_expiration(self.expiration, now, mode)
    }
}

/// A request for a specific token, either a plain request for a named
/// type or a full command describing a WebKDC operation.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RequestToken {
    pub command: Option<String>,
    pub requested_type: Option<String>,
    pub auth: Option<String>,
    pub proxy_type: Option<String>,
    pub state: Option<Vec<u8>>,
    pub return_url: Option<String>,
    pub options: Option<String>,
    pub initial_factors: Option<String>,
    pub session_factors: Option<String>,
}

impl RequestToken {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        command: Option<String>,
        requested_type: Option<String>,
        auth: Option<String>,
        proxy_type: Option<String>,
        state: Option<Vec<u8>>,
        return_url: Option<String>,
        options: Option<String>,
        initial_factors: Option<String>,
        session_factors: Option<String>,
    ) -> Result<Self> {
        let t = Self {
            command,
            requested_type,
            auth,
            proxy_type,
            state,
            return_url,
            options,
            initial_factors,
            session_factors,
        };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = Vec::new();
        if let Some(v) = &self.command {
            out.push(("cmd".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.requested_type {
            out.push(("type".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.auth {
            out.push(("auth".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.proxy_type {
            out.push(("ptype".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.state {
            out.push(("state".into(), attr_bytes(AttrValue::Bytes(v))));
        }
        if let Some(v) = &self.return_url {
            out.push(("rt".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.options {
            out.push(("opts".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.initial_factors {
            out.push(("if".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.session_factors {
            out.push(("sf".into(), attr_bytes(AttrValue::Str(v))));
        }
        out
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            command: find_str(attrs, "cmd")?,
            requested_type: find_str(attrs, "type")?,
            auth: find_str(attrs, "auth")?,
            proxy_type: find_str(attrs, "ptype")?,
            state: find_bytes(attrs, "state"),
            return_url: find_str(attrs, "rt")?,
            options: find_str(attrs, "opts")?,
            initial_factors: find_str(attrs, "if")?,
            session_factors: find_str(attrs, "sf")?,
        })
    }

    fn validate(&self, _mode: Mode, _now: u64) -> Result<()> {
        if self.command.is_some() {
            let extras_set = self.requested_type.is_some()
                || self.auth.is_some()
                || self.proxy_type.is_some()
                || self.state.is_some()
                || self.return_url.is_some()
                || self.options.is_some()
                || self.initial_factors.is_some()
                || self.session_factors.is_some();
            if extras_set {
                return Err(err!(
                    ErrorKind::Corrupt,
                    "a command request token cannot also carry type/auth/state fields"
                ));
            }
            return Ok(());
        }

        let requested_type = self.requested_type.as_deref().ok_or_else(|| {
            err!(ErrorKind::Corrupt, "request token needs either command or type")
        })?;
        if self.return_url.is_none() {
            return Err(err!(ErrorKind::Corrupt, "request token is missing return_url"));
        }
        match requested_type {
            "id" => {
                let auth = self
                    .auth
                    .as_deref()
                    .ok_or_else(|| err!(ErrorKind::Corrupt, "id request is missing auth"))?;
                require_enum(auth, "auth", &["krb5", "webkdc"])
            }
            "proxy" => {
                let proxy_type = self.proxy_type.as_deref().ok_or_else(|| {
                    err!(ErrorKind::Corrupt, "proxy request is missing proxy_type")
                })?;
                require_enum(proxy_type, "ptype", &["krb5"])
            }
            other => Err(err!(ErrorKind::Corrupt, "unrecognized requested type {other:?}")),
        }
    }
}

/// The multifactor state the WebKDC records alongside a subject's
/// authentication.
#[derive(Clone, Debug, PartialEq)]
pub struct WebkdcFactorToken {
    pub subject: String,
    pub expiration: u64,
    pub initial_factors: Option<String>,
    pub session_factors: Option<String>,
}

impl WebkdcFactorToken {
    pub fn new(
        subject: String,
        expiration: u64,
        initial_factors: Option<String>,
        session_factors: Option<String>,
    ) -> Result<Self> {
        let t = Self { subject, expiration, initial_factors, session_factors };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = vec![
            ("sub".into(), attr_bytes(AttrValue::Str(&self.subject))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ];
        if let Some(v) = &self.initial_factors {
            out.push(("if".into(), attr_bytes(AttrValue::Str(v))));
        }
        if let Some(v) = &self.session_factors {
            out.push(("sf".into(), attr_bytes(AttrValue::Str(v))));
        }
        out
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            subject: require_str(attrs, "sub")?,
            expiration: require_time(attrs, "exp")?,
            initial_factors: find_str(attrs, "if")?,
            session_factors: find_str(attrs, "sf")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        check_expiration(self.expiration, now, mode)?;
        if self.initial_factors.is_none() && self.session_factors.is_none() {
            return Err(err!(
                ErrorKind::Corrupt,
                "no factors present in webkdc-factor token"
            ));
        }
        Ok(())
    }
}

/// A WebKDC-internal proxy credential, the building block `proxy`
/// tokens are minted from.
#[derive(Clone, Debug, PartialEq)]
pub struct WebkdcProxyToken {
    pub subject: String,
    pub proxy_type: String,
    pub proxy_subject: String,
    pub expiration: u64,
}

impl WebkdcProxyToken {
    pub fn new(subject: String, proxy_type: String, proxy_subject: String, expiration: u64) -> Result<Self> {
        let t = Self { subject, proxy_type, proxy_subject, expiration };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            ("sub".into(), attr_bytes(AttrValue::Str(&self.subject))),
            ("ptype".into(), attr_bytes(AttrValue::Str(&self.proxy_type))),
            ("psub".into(), attr_bytes(AttrValue::Str(&self.proxy_subject))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ]
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            subject: require_str(attrs, "sub")?,
            proxy_type: require_str(attrs, "ptype")?,
            proxy_subject: require_str(attrs, "psub")?,
            expiration: require_time(attrs, "exp")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        require_enum(&self.proxy_type, "ptype", &["krb5", "remuser", "otp"])?;
        check_expiration(self.expiration, now, mode)
    }
}

/// A service identity used internally between WebKDC components.
#[derive(Clone, Debug, PartialEq)]
pub struct WebkdcServiceToken {
    pub subject: String,
    pub session_key: Vec<u8>,
    pub expiration: u64,
}

impl WebkdcServiceToken {
    pub fn new(subject: String, session_key: Vec<u8>, expiration: u64) -> Result<Self> {
        let t = Self { subject, session_key, expiration };
        t.validate(Mode::Encode, 0)?;
        Ok(t)
    }

    fn to_attrs(&self) -> Vec<(String, Vec<u8>)> {
        vec![
            ("sub".into(), attr_bytes(AttrValue::Str(&self.subject))),
            ("sk".into(), attr_bytes(AttrValue::Bytes(&self.session_key))),
            ("exp".into(), attr_bytes(AttrValue::Time(self.expiration))),
        ]
    }

    fn from_attrs(attrs: &[(String, Vec<u8>)]) -> Result<Self> {
        Ok(Self {
            subject: require_str(attrs, "sub")?,
            session_key: require_bytes(attrs, "sk")?,
            expiration: require_time(attrs, "exp")?,
        })
    }

    fn validate(&self, mode: Mode, now: u64) -> Result<()> {
        check_expiration(self.expiration, now, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejects_both_password_and_otp() {
        let t = LoginToken {
            username: "jdoe".into(),
            password: Some("hunter2".into()),
            otp: Some("123456".into()),
            otp_type: None,
        };
        let err = t.validate(Mode::Encode, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn login_rejects_neither_password_nor_otp() {
        let t = LoginToken {
            username: "jdoe".into(),
            password: None,
            otp: None,
            otp_type: None,
        };
        assert!(t.validate(Mode::Encode, 0).is_err());
    }

    #[test]
    fn id_token_rejects_unknown_auth() {
        let t = IdToken {
            auth: "ntlm".into(),
            expiration: 999_999,
            subject: Some("jdoe".into()),
            auth_data: None,
        };
        let err = t.validate(Mode::Encode, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn app_token_expiration_only_checked_on_decode() {
        let t = AppToken {
            expiration: 100,
            session_key: None,
            subject: Some("jdoe".into()),
            authz_subject: None,
            last_used: 0,
            initial_factors: None,
            session_factors: None,
            loa: 0,
        };
        assert!(t.validate(Mode::Encode, 500).is_ok());
        let err = t.validate(Mode::Decode, 500).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[test]
    fn request_token_command_and_type_are_mutually_exclusive() {
        let t = RequestToken {
            command: Some("something".into()),
            requested_type: Some("id".into()),
            ..Default::default()
        };
        assert!(t.validate(Mode::Encode, 0).is_err());
    }

    #[test]
    fn request_token_type_id_requires_auth() {
        let t = RequestToken {
            requested_type: Some("id".into()),
            return_url: Some("https://example.org/".into()),
            ..Default::default()
        };
        assert!(t.validate(Mode::Encode, 0).is_err());
    }

    #[test]
    fn request_token_command_alone_is_valid() {
        let t = RequestToken {
            command: Some("login".into()),
            ..Default::default()
        };
        assert!(t.validate(Mode::Encode, 0).is_ok());
    }

    #[test]
    fn webkdc_proxy_accepts_all_three_proxy_types() {
        for pt in ["krb5", "remuser", "otp"] {
            let t = WebkdcProxyToken {
                subject: "jdoe".into(),
                proxy_type: pt.into(),
                proxy_subject: "krb5:service/host".into(),
                expiration: 999_999,
            };
            assert!(t.validate(Mode::Encode, 0).is_ok());
        }
    }

    #[test]
    fn plain_proxy_token_only_accepts_krb5() {
        let t = ProxyToken {
            subject: "jdoe".into(),
            proxy_type: "otp".into(),
            webkdc_proxy: vec![1, 2, 3],
            expiration: 999_999,
        };
        assert!(t.validate(Mode::Encode, 0).is_err());
    }

    #[test]
    fn app_token_attrs_round_trip() {
        let t = AppToken {
            expiration: 12345,
            session_key: Some(vec![9, 9, 9]),
            subject: Some("jdoe".into()),
            authz_subject: None,
            last_used: 100,
            initial_factors: Some("p".into()),
            session_factors: None,
            loa: 3,
        };
        let attrs = t.to_attrs();
        let decoded = AppToken::from_attrs(&attrs).unwrap();
        assert_eq!(t, decoded);
    }
}
