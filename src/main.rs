#[tokio::main]
async fn main() {
    barber_booking::run().await;
}
