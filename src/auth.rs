/// 인증 정보
/// 인증 자체는 앞단 게이트웨이가 처리하고, 검증된 사용자 정보를 헤더로 전달한다.
/// 이 서비스는 자격 증명을 발급하지 않는다.
use crate::auction::model::UserId;
use axum::http::HeaderMap;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Bidder,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    pub fn bidder(id: UserId) -> Self {
        Self {
            id,
            role: Role::Bidder,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 요청 헤더에서 현재 사용자 조회. 없거나 형식이 잘못되면 None.
pub fn current_user(headers: &HeaderMap) -> Option<CurrentUser> {
    let id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<UserId>()
        .ok()?;
    let role = match headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    {
        Some(role) if role.eq_ignore_ascii_case("admin") => Role::Admin,
        _ => Role::Bidder,
    };
    Some(CurrentUser { id, role })
}
