/*
 * Responsibility
 * - v1 の URL 構造を定義 (フルパスで登録。MatchedPath をそのまま policy の key にするため nest しない)
 * - 各エンドポイントの保護レベル (open / public / secured / owned) をハンドラと同じ場所で宣言する
 * - routes() と route_table() は同じ endpoints() から組み立てる
 */
use axum::{
    Router,
    http::Method,
    routing::{MethodRouter, delete, get, post},
};

use crate::api::v1::handlers::{
    aquariums::{
        delete_accessory, delete_aquarium, delete_inhabitant, delete_ornament, detach_accessory,
        detach_inhabitant, detach_ornament, get_aquarium, list_aquariums,
    },
    auth::{login, me, register},
};
use crate::middleware::auth::{EndpointPolicy, RouteTable};
use crate::services::auth::ResourceKind;
use crate::state::AppState;

pub const REGISTER: &str = "/api/v1/auth/register";
pub const LOGIN: &str = "/api/v1/auth/login";
pub const ME: &str = "/api/v1/auth/me";
pub const AQUARIUMS: &str = "/api/v1/aquariums";
pub const AQUARIUM: &str = "/api/v1/aquariums/{id}";
pub const AQUARIUM_INHABITANT: &str = "/api/v1/aquariums/{aquariumId}/inhabitants/{itemId}";
pub const AQUARIUM_ACCESSORY: &str = "/api/v1/aquariums/{aquariumId}/accessories/{itemId}";
pub const AQUARIUM_ORNAMENT: &str = "/api/v1/aquariums/{aquariumId}/ornaments/{itemId}";
pub const INHABITANT: &str = "/api/v1/inhabitants/{id}";
pub const ACCESSORY: &str = "/api/v1/accessories/{id}";
pub const ORNAMENT: &str = "/api/v1/ornaments/{id}";

/// One path: its handlers and a policy per method they serve.
struct Endpoint {
    path: &'static str,
    handlers: MethodRouter<AppState>,
    policies: Vec<(Method, EndpointPolicy)>,
}

impl Endpoint {
    fn new(path: &'static str, handlers: MethodRouter<AppState>) -> Self {
        Self {
            path,
            handlers,
            policies: Vec::new(),
        }
    }

    fn policy(mut self, method: Method, policy: EndpointPolicy) -> Self {
        self.policies.push((method, policy));
        self
    }
}

fn endpoints() -> Vec<Endpoint> {
    use ResourceKind::*;

    vec![
        Endpoint::new(REGISTER, post(register)).policy(Method::POST, EndpointPolicy::public()),
        Endpoint::new(LOGIN, post(login)).policy(Method::POST, EndpointPolicy::public()),
        Endpoint::new(ME, get(me)).policy(Method::GET, EndpointPolicy::secured()),
        Endpoint::new(AQUARIUMS, get(list_aquariums))
            .policy(Method::GET, EndpointPolicy::secured()),
        Endpoint::new(AQUARIUM, get(get_aquarium).delete(delete_aquarium))
            .policy(Method::GET, EndpointPolicy::open())
            .policy(Method::DELETE, EndpointPolicy::owned(Aquarium, "id")),
        // detaching an item is authorized by the aquarium it sits in
        Endpoint::new(AQUARIUM_INHABITANT, delete(detach_inhabitant))
            .policy(Method::DELETE, EndpointPolicy::owned(Aquarium, "aquariumId")),
        Endpoint::new(AQUARIUM_ACCESSORY, delete(detach_accessory))
            .policy(Method::DELETE, EndpointPolicy::owned(Aquarium, "aquariumId")),
        Endpoint::new(AQUARIUM_ORNAMENT, delete(detach_ornament))
            .policy(Method::DELETE, EndpointPolicy::owned(Aquarium, "aquariumId")),
        Endpoint::new(INHABITANT, delete(delete_inhabitant))
            .policy(Method::DELETE, EndpointPolicy::owned(Inhabitant, "id")),
        Endpoint::new(ACCESSORY, delete(delete_accessory))
            .policy(Method::DELETE, EndpointPolicy::owned(Accessory, "id")),
        Endpoint::new(ORNAMENT, delete(delete_ornament))
            .policy(Method::DELETE, EndpointPolicy::owned(Ornament, "id")),
    ]
}

pub fn routes() -> Router<AppState> {
    router_from(endpoints())
}

fn router_from(endpoints: Vec<Endpoint>) -> Router<AppState> {
    endpoints
        .into_iter()
        .fold(Router::new(), |router, e| router.route(e.path, e.handlers))
}

pub fn route_table() -> RouteTable {
    endpoints()
        .into_iter()
        .flat_map(|e| e.policies.into_iter().map(move |(m, p)| (m, e.path, p)))
        .fold(RouteTable::new(), |table, (method, path, policy)| {
            table.with(method, path, policy)
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::{Next, from_fn},
        response::Response,
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::TokenService;

    const METHODS: [Method; 5] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ];

    #[test]
    fn aquarium_lookup_is_open_but_delete_is_owned() {
        let table = route_table();
        assert_eq!(table.get(&Method::GET, AQUARIUM), Some(EndpointPolicy::open()));

        let owned = table.policy_for(&Method::DELETE, AQUARIUM).ownership().unwrap();
        assert_eq!(owned.kind, ResourceKind::Aquarium);
        assert_eq!(owned.param, "id");
    }

    #[test]
    fn detach_routes_check_the_aquarium() {
        let table = route_table();
        for path in [AQUARIUM_INHABITANT, AQUARIUM_ACCESSORY, AQUARIUM_ORNAMENT] {
            let owned = table.policy_for(&Method::DELETE, path).ownership().unwrap();
            assert_eq!(owned.kind, ResourceKind::Aquarium);
            assert_eq!(owned.param, "aquariumId");
        }
    }

    #[test]
    fn item_routes_check_their_own_kind() {
        let table = route_table();
        for (path, kind) in [
            (INHABITANT, ResourceKind::Inhabitant),
            (ACCESSORY, ResourceKind::Accessory),
            (ORNAMENT, ResourceKind::Ornament),
        ] {
            assert_eq!(table.policy_for(&Method::DELETE, path).ownership().unwrap().kind, kind);
        }
    }

    #[test]
    fn auth_endpoints_are_public() {
        let table = route_table();
        assert!(!table.policy_for(&Method::POST, REGISTER).requires_authentication());
        assert!(!table.policy_for(&Method::POST, LOGIN).requires_authentication());
        assert!(table.policy_for(&Method::GET, ME).requires_authentication());
    }

    // stands in for every handler
    async fn served(_req: Request<Body>, _next: Next) -> Response {
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::empty())
            .unwrap()
    }

    fn concrete(template: &str) -> String {
        template
            .split('/')
            .map(|seg| if seg.starts_with('{') { "1" } else { seg })
            .collect::<Vec<_>>()
            .join("/")
    }

    #[tokio::test]
    async fn every_served_route_has_a_declared_policy() {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/aquarium")
            .unwrap();
        let tokens = Arc::new(TokenService::new(b"secret", "aquarium-api", 60, 0));
        // method routers answer 405 themselves for methods they do not serve
        let stubbed = endpoints()
            .into_iter()
            .map(|mut e| {
                e.handlers = e.handlers.route_layer(from_fn(served));
                e
            })
            .collect();
        let app = router_from(stubbed).with_state(AppState::new(db, tokens));

        let table = route_table();
        let paths: Vec<&'static str> = endpoints().iter().map(|e| e.path).collect();
        let mut served_routes = HashSet::new();

        for path in paths {
            for method in METHODS {
                let req = Request::builder()
                    .method(method.clone())
                    .uri(concrete(path))
                    .body(Body::empty())
                    .unwrap();
                let status = app.clone().oneshot(req).await.unwrap().status();

                match status {
                    StatusCode::NO_CONTENT => {
                        assert!(
                            table.get(&method, path).is_some(),
                            "{method} {path} is served but has no policy"
                        );
                        served_routes.insert((method, path));
                    }
                    StatusCode::METHOD_NOT_ALLOWED => {}
                    other => panic!("{method} {path}: unexpected {other}"),
                }
            }
        }

        // and every declared policy belongs to a served route
        for (method, path) in table.entries() {
            assert!(
                served_routes.contains(&(method.clone(), path)),
                "{method} {path} has a policy but no handler"
            );
        }
        assert_eq!(served_routes.len(), table.len());
    }
}
