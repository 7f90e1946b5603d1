use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::DateTime;
use payments_service::config::{
    AuthConfig, Config, DatabaseConfig, RazorpayConfig, ServerConfig,
};
use payments_service::middleware::auth::Claims;
use payments_service::models::{Mentor, Project, TransactionStatus};
use payments_service::services::razorpay::compute_signature;
use payments_service::startup::Application;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_RAZORPAY_SECRET: &str = "test_key_secret";
pub const TEST_RAZORPAY_KEY_ID: &str = "rzp_test_key";

pub struct TestApp {
    pub address: String,
    pub db: mongodb::Database,
    pub gateway: MockServer,
}

impl TestApp {
    /// Spawn the application against a throwaway database and a mocked
    /// gateway. Returns `None` when no test store is available, letting the
    /// suite pass on machines without MongoDB.
    pub async fn try_spawn() -> Option<Self> {
        let mongo_uri = std::env::var("TEST_MONGODB_URI").ok()?;
        let db_name = format!("payments_test_{}", uuid::Uuid::new_v4().simple());

        let gateway = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(mongo_uri),
                db_name: db_name.clone(),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            },
            razorpay: RazorpayConfig {
                key_id: TEST_RAZORPAY_KEY_ID.to_string(),
                key_secret: Secret::new(TEST_RAZORPAY_SECRET.to_string()),
                api_base_url: gateway.uri(),
            },
            service_name: "payments-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept requests.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            db,
            gateway,
        })
    }

    /// Mount a one-shot gateway order response with the given order id.
    pub async fn mock_gateway_order(&self, order_id: &str, amount: u64) {
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": order_id,
                "entity": "order",
                "amount": amount,
                "amount_paid": 0,
                "amount_due": amount,
                "currency": "INR",
                "receipt": "test_receipt",
                "status": "created",
            })))
            .up_to_n_times(1)
            .mount(&self.gateway)
            .await;
    }

    pub async fn seed_mentor(&self, id: &str, name: &str) {
        self.db
            .collection::<Mentor>("mentors")
            .insert_one(
                Mentor {
                    id: id.to_string(),
                    name: name.to_string(),
                    title: "Senior Engineer".to_string(),
                    company: "Acme".to_string(),
                    hourly_rate: 7500,
                },
                None,
            )
            .await
            .expect("Failed to seed mentor");
    }

    pub async fn seed_project(&self, id: &str, title: &str, price: u64) {
        self.db
            .collection::<Project>("projects")
            .insert_one(
                Project {
                    id: id.to_string(),
                    title: title.to_string(),
                    price,
                },
                None,
            )
            .await
            .expect("Failed to seed project");
    }

    /// Insert a pending purchase directly, bypassing initiation.
    pub async fn seed_pending_purchase(&self, user_id: &str, project_id: &str, order_id: &str) {
        use payments_service::models::ProjectPurchase;
        let now = DateTime::now();
        self.db
            .collection::<ProjectPurchase>("project_purchases")
            .insert_one(
                ProjectPurchase {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    project_id: project_id.to_string(),
                    order_id: order_id.to_string(),
                    amount: 299900,
                    currency: "INR".to_string(),
                    status: TransactionStatus::Pending,
                    created_at: now,
                    updated_at: now,
                    purchased_at: None,
                },
                None,
            )
            .await
            .expect("Failed to seed purchase");
    }

    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}

/// Issue a bearer token the way the identity provider would.
pub fn issue_token(user_id: &str, email: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(|e| e.to_string()),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to issue test token")
}

/// Compute the signature the gateway would return for a completed payment.
pub fn gateway_signature(order_id: &str, payment_id: &str) -> String {
    compute_signature(
        TEST_RAZORPAY_SECRET,
        &format!("{}|{}", order_id, payment_id),
    )
    .expect("Failed to compute signature")
}
