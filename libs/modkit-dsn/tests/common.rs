#![allow(dead_code)]
use anyhow::Result;
use std::time::Duration;

use testcontainers::{runners::AsyncRunner, ContainerAsync, ContainerRequest, ImageExt};

/// A running server plus the connection URL pointing at it.
pub struct DbUnderTest<I: testcontainers::Image> {
    pub url: String,
    _container: ContainerAsync<I>,
}

pub const PASSWORD: &str = "p'ss w\\rd";

fn encoded_password() -> String {
    percent_encoding::utf8_percent_encode(PASSWORD, percent_encoding::NON_ALPHANUMERIC).to_string()
}

pub async fn bring_up_postgres() -> Result<DbUnderTest<testcontainers_modules::postgres::Postgres>> {
    use testcontainers_modules::postgres::Postgres;

    let container = ContainerRequest::from(Postgres::default())
        .with_env_var("POSTGRES_PASSWORD", PASSWORD)
        .with_env_var("POSTGRES_USER", "user")
        .with_env_var("POSTGRES_DB", "app")
        .start()
        .await?;
    let port = container.get_host_port_ipv4(5432).await?;
    wait_for_tcp("127.0.0.1", port, Duration::from_secs(20)).await?;

    Ok(DbUnderTest {
        url: format!(
            "postgres://user:{}@127.0.0.1:{port}/app?sslmode=disable",
            encoded_password()
        ),
        _container: container,
    })
}

pub async fn bring_up_mysql() -> Result<DbUnderTest<testcontainers_modules::mysql::Mysql>> {
    use testcontainers_modules::mysql::Mysql;

    let container = ContainerRequest::from(Mysql::default())
        .with_env_var("MYSQL_ROOT_PASSWORD", "root")
        .with_env_var("MYSQL_USER", "user")
        .with_env_var("MYSQL_PASSWORD", PASSWORD)
        .with_env_var("MYSQL_DATABASE", "app")
        .start()
        .await?;
    let port = container.get_host_port_ipv4(3306).await?;
    wait_for_tcp("127.0.0.1", port, Duration::from_secs(30)).await?;

    Ok(DbUnderTest {
        url: format!(
            "mysql://user:{}@127.0.0.1:{port}/app?tls=preferred",
            encoded_password()
        ),
        _container: container,
    })
}

async fn wait_for_tcp(host: &str, port: u16, timeout: Duration) -> Result<()> {
    use tokio::{
        net::TcpStream,
        time::{sleep, Instant},
    };
    let deadline = Instant::now() + timeout;
    loop {
        if TcpStream::connect((host, port)).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            anyhow::bail!("Timeout waiting for {host}:{port}");
        }
        sleep(Duration::from_millis(200)).await;
    }
}
