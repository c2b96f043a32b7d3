use barber_booking::config::Config;
use barber_booking::domain::models::directory::{Barber, Customer, Service};
use barber_booking::domain::models::session::{Role, SessionRecord};
use barber_booking::infra::factory::bootstrap_state;
use barber_booking::state::AppState;
use chrono::{Duration as ChronoDuration, NaiveTime, Utc};
use colored::*;
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

const SLOTS_PER_DAY: i64 = 20;

enum Outcome {
    Won,
    Lost,
    Failed(String),
}

struct WaveReport {
    won: usize,
    lost: usize,
    failed: Vec<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[tokio::main]
async fn main() {
    let base_url = env::var("BENCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let waves: i64 = env_or("BENCH_WAVES", 10);
    let concurrency: usize = env_or("BENCH_CONCURRENCY", 50);

    println!("{}", "Starting reservation contention benchmark".bold().green());
    println!("Target URL: {}  waves: {}  requests/wave: {}", base_url, waves, concurrency);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    println!("\n{}", "Seeding benchmark data...".yellow());
    let config = Config::from_env();
    let state = bootstrap_state(&config).await;
    let (barber_id, service_id, customers) = seed(&state, concurrency).await;
    println!("{}", "Data created successfully.".green());
    println!("   Barber ID:  {}", barber_id);
    println!("   Service ID: {}", service_id);

    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let mut violations = 0;
    let mut total_won = 0;
    let mut total_lost = 0;
    let mut total_failed = 0;

    println!("\n{:<6} | {:<8} | {:<8} | {:<8}", "Wave", "Won", "Lost", "Errors");
    println!("{:-<6}-+-{:-<8}-+-{:-<8}-+-{:-<8}", "", "", "", "");

    for wave in 0..waves {
        let date = state.clock.today(Utc::now()) + ChronoDuration::days(1 + wave / SLOTS_PER_DAY);
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
            + ChronoDuration::minutes((wave % SLOTS_PER_DAY) * config.slot_interval_min);
        let Some(start) = state.clock.to_instant(date, time) else {
            println!("{:<6} | skipped (local time does not exist)", wave);
            continue;
        };

        let report = run_wave(&client, &base_url, &barber_id, &service_id, &customers, start.timestamp_millis(), &mut histogram).await;
        let line = format!("{:<6} | {:<8} | {:<8} | {:<8}", wave, report.won, report.lost, report.failed.len());
        if report.won == 1 {
            println!("{}", line);
        } else {
            violations += 1;
            println!("{}", line.red().bold());
        }
        for message in report.failed.iter().take(3) {
            println!("         {}", message.yellow());
        }
        total_won += report.won;
        total_lost += report.lost;
        total_failed += report.failed.len();
    }

    println!("\n{}", "=".repeat(60));
    println!("Winners: {}  Losers (SLOT_ALREADY_TAKEN): {}  Errors: {}", total_won, total_lost, total_failed);
    println!(
        "Latency ms  mean {:.2}  p50 {:.2}  p99 {:.2}  max {:.2}",
        histogram.mean() / 1000.0,
        histogram.value_at_quantile(0.50) as f64 / 1000.0,
        histogram.value_at_quantile(0.99) as f64 / 1000.0,
        histogram.max() as f64 / 1000.0,
    );
    if violations == 0 {
        println!("{}", "Every wave had exactly one winner.".green().bold());
    } else {
        println!("{}", format!("{} wave(s) did not have exactly one winner.", violations).red().bold());
    }
}

struct BenchCustomer {
    id: String,
    name: String,
    token: String,
}

async fn seed(state: &AppState, customers: usize) -> (String, String, Vec<BenchCustomer>) {
    let directory = &state.repos.directory;
    let barber = directory.create_barber(&Barber::new("Bench Barber".to_string())).await
        .expect("Failed to create barber");
    let service = directory.create_service(&Service::new("Bench Cut".to_string(), 30)).await
        .expect("Failed to create service");

    let mut seeded = Vec::with_capacity(customers);
    for i in 0..customers {
        let customer = Customer::new(format!("Bench Customer {}", i), format!("+1555{:07}", i));
        let created = directory.create_customer(&customer).await.expect("Failed to create customer");
        let (session, token) = SessionRecord::issue(created.id.clone(), Role::Customer, ChronoDuration::hours(2));
        state.repos.sessions.create(&session).await.expect("Failed to create session");
        seeded.push(BenchCustomer { id: created.id, name: created.name, token });
    }
    (barber.id, service.id, seeded)
}

async fn run_wave(
    client: &Client,
    base_url: &str,
    barber_id: &str,
    service_id: &str,
    customers: &[BenchCustomer],
    start_ms: i64,
    histogram: &mut Histogram<u64>,
) -> WaveReport {
    let mut set = JoinSet::new();
    for (i, customer) in customers.iter().enumerate() {
        let client = client.clone();
        let url = format!("{}/api/v1/reservations", base_url);
        let token = customer.token.clone();
        let body = json!({
            "barberId": barber_id,
            "serviceId": service_id,
            "customerId": customer.id,
            "customerName": customer.name,
            "customerPhone": format!("+1555{:07}", i),
            "dateTimestamp": start_ms,
            "timeTimestamp": start_ms,
        });

        set.spawn(async move {
            let req_start = Instant::now();
            let res = client.post(&url).bearer_auth(&token).json(&body).send().await;
            let latency = req_start.elapsed();

            let outcome = match res {
                Ok(r) if r.status() == StatusCode::CREATED => Outcome::Won,
                Ok(r) => {
                    let status = r.status();
                    let body: Value = r.json().await.unwrap_or_default();
                    match body["error"].as_str() {
                        Some("SLOT_ALREADY_TAKEN") => Outcome::Lost,
                        Some(code) => Outcome::Failed(format!("{} {}", status, code)),
                        None => Outcome::Failed(status.to_string()),
                    }
                }
                Err(e) => Outcome::Failed(e.to_string()),
            };
            (latency, outcome)
        });
    }

    let mut report = WaveReport { won: 0, lost: 0, failed: Vec::new() };
    while let Some(joined) = set.join_next().await {
        let Ok((latency, outcome)) = joined else {
            report.failed.push("request task panicked".to_string());
            continue;
        };
        let _ = histogram.record(latency.as_micros() as u64);
        match outcome {
            Outcome::Won => report.won += 1,
            Outcome::Lost => report.lost += 1,
            Outcome::Failed(message) => report.failed.push(message),
        }
    }
    report
}
