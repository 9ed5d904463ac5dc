use crate::application_port::*;
use crate::domain_model::*;
use anyhow::bail;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        SigningKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 codec with one secret per token kind, so a leaked refresh secret
/// cannot forge access tokens and the other way round.
pub struct JwtHs256Codec {
    issuer: String,
    audience: String,
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> anyhow::Result<Self> {
        if cfg.access_secret.is_empty() || cfg.refresh_secret.is_empty() {
            bail!("token signing secrets must not be empty");
        }
        if cfg.access_secret == cfg.refresh_secret {
            bail!("access and refresh signing secrets must differ");
        }

        // Only HS256 is accepted; any other `alg` header is rejected before
        // the signature is checked.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Ok(JwtHs256Codec {
            access: SigningKeys::from_secret(&cfg.access_secret),
            refresh: SigningKeys::from_secret(&cfg.refresh_secret),
            issuer: cfg.issuer,
            audience: cfg.audience,
            validation,
        })
    }

    #[inline]
    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

fn classify(error: &jsonwebtoken::errors::Error) -> CodecError {
    match error.kind() {
        ErrorKind::ExpiredSignature => CodecError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => CodecError::InvalidSignature,
        _ => CodecError::Malformed,
    }
}

impl TokenCodec for JwtHs256Codec {
    fn mint(
        &self,
        kind: TokenKind,
        user_id: UserId,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, CodecError> {
        let claims = Claims {
            uid: user_id,
            sid: session_id,
            kind,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    fn parse(&self, kind: TokenKind, token: &str) -> Result<Claims, CodecError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| classify(&e))?;
        if data.claims.kind != kind {
            return Err(CodecError::Malformed);
        }
        Ok(data.claims)
    }
}
