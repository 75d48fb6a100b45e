#[tokio::main]
async fn main() {
    carwash_backend::run().await;
}
