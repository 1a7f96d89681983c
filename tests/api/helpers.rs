use form_relay::configuration::get_configuration;
use form_relay::configuration::Environment;
use form_relay::configuration::Settings;
use form_relay::startup::Application;
use form_relay::telemetry::get_subscriber;
use form_relay::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Init the tracing subscriber once only.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // two different closure types can't share one variable, hence the arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).expect("init test subscriber");
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).expect("init test subscriber");
        }
    };
});

pub const API_TOKEN: &str = "test-api-token";

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    /// Stands in for the email-marketing API
    pub subscriber_api: MockServer,
    /// Stands in for the challenge verification service
    pub challenge_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{endpoint}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /subscribe`
    pub async fn post_newsletter(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.post_json("/subscribe", body).await
    }

    /// `POST /contact`
    pub async fn post_contact(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.post_json("/contact", body).await
    }

    /// `POST /contact` as if relayed for `client_ip`
    pub async fn post_contact_from(
        &self,
        client_ip: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/contact", self.addr))
            .header("x-forwarded-for", client_ip)
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_raw(
        &self,
        endpoint: &str,
        body: &'static str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{endpoint}", self.addr))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }
}

/// Upstream accepts the submission and echoes the created record
pub fn created(email: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "data": { "id": "1", "email": email, "status": "active" }
    }))
}

/// Upstream refuses because the address is already on the list
pub fn email_conflict() -> ResponseTemplate {
    ResponseTemplate::new(422).set_body_json(json!({
        "message": "The given data was invalid.",
        "errors": { "email": ["The email already exists."] }
    }))
}

/// Mount a catch-all `POST /api/subscribers` mock expecting `n` calls. Keep
/// the guard alive (and -named-) for the duration of the test.
pub async fn expect_upstream_calls(
    app: &TestApp,
    n: u64,
    response: ResponseTemplate,
) {
    Mock::given(path("/api/subscribers"))
        .and(method("POST"))
        .respond_with(response)
        .expect(n)
        .mount(&app.subscriber_api)
        .await;
}

pub fn valid_contact() -> Value {
    json!({
        "email": "a@b.com",
        "name": "Jo",
        "subject": "Hi!",
        "message": "1234567890",
    })
}

pub async fn spawn_app() -> TestApp { spawn_app_with(|_| {}).await }

/// Spawn the real application on a random port, pointed at two fresh mock
/// servers. `customise` runs last, on top of deterministic test defaults, so
/// nothing from the developer's environment leaks in.
pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let subscriber_api = MockServer::start().await;
    let challenge_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");

        // port 0 is reserved by the OS; the server will be spawned on a random
        // available port, which is then made known to clients
        cfg.application.port = 0;
        cfg.application.client_ip_header = "x-nf-client-connection-ip".to_string();
        cfg.environment = Environment::Local;

        cfg.subscriber_api.base_url = subscriber_api.uri();
        cfg.subscriber_api.api_token = Some(Secret::new(API_TOKEN.to_string()));
        cfg.subscriber_api.timeout_milliseconds = 2_000;

        cfg.challenge.verify_url = format!("{}/siteverify", challenge_server.uri());
        cfg.challenge.secret_key = None;
        cfg.challenge.timeout_milliseconds = 2_000;

        cfg.forms.newsletter.rate_limit_max = 5;
        cfg.forms.newsletter.rate_limit_window_seconds = 600;
        cfg.forms.newsletter.group_id = None;
        cfg.forms.contact.rate_limit_max = 3;
        cfg.forms.contact.rate_limit_window_seconds = 600;
        cfg.forms.contact.group_id = None;

        customise(&mut cfg);
        cfg
    };

    let app = Application::build(cfg).await.expect("build application");
    let port = app.port();
    let addr = format!("http://localhost:{port}");
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        port,
        subscriber_api,
        challenge_server,
        api_client: reqwest::Client::new(),
    }
}
