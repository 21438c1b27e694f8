use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// LiveKit 的 access token 只要短效
pub const TOKEN_TTL_SECS: i64 = 600;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub room_list:   bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub room_record: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims { pub iss:String, pub nbf:i64, pub exp:i64, pub video:VideoGrant }

pub fn sign(api_key:&str, secret:&str, video:VideoGrant) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let c = Claims { iss: api_key.into(), nbf: now, exp: now + TOKEN_TTL_SECS, video };
    Ok(encode(&Header::default(), &c, &EncodingKey::from_secret(secret.as_bytes()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn token_carries_key_and_grants() {
        let token = sign("lk-key", "lk-secret", VideoGrant { room_list: true, ..Default::default() }).unwrap();
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(b"lk-secret"),
                                    &Validation::new(Algorithm::HS256)).unwrap();
        assert_eq!(data.claims.iss, "lk-key");
        assert!(data.claims.video.room_list);
        assert!(!data.claims.video.room_record);
        assert_eq!(data.claims.exp - data.claims.nbf, TOKEN_TTL_SECS);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = sign("lk-key", "lk-secret", VideoGrant::default()).unwrap();
        let res = decode::<Claims>(&token, &DecodingKey::from_secret(b"other"),
                                   &Validation::new(Algorithm::HS256));
        assert!(res.is_err());
    }
}
