#[tokio::main]
async fn main() {
    dosera::init_tracing();

    if let Err(e) = dosera::run().await {
        tracing::error!("Fatal: {e}");
        std::process::exit(1);
    }
}
