#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    inkpress::run().await
}
