use clap::Parser;
use user_adapter::utils::error::ErrorSeverity;
use user_adapter::utils::{logger, validation::Validate};
use user_adapter::{AdapterConfig, CliOptions, RestBackend, UserAdapter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = CliOptions::parse();

    // 初始化日誌
    logger::init_cli_logger(options.verbose);

    tracing::info!("Starting user-adapter smoke test");

    // 載入並驗證配置
    let config = AdapterConfig::from_file(&options.config)?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(3);
    }

    println!("✅ 配置驗證通過");
    println!("📡 Backend: {}", config.server.url);

    let adapter = UserAdapter::from_config(&config);

    if let Err(e) = run_smoke_sequence(&adapter, &options).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Smoke test failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium | ErrorSeverity::High => 2,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    println!("\n🎉 Smoke test 完成！");

    Ok(())
}

async fn run_smoke_sequence(
    adapter: &UserAdapter<RestBackend>,
    options: &CliOptions,
) -> user_adapter::Result<()> {
    println!("\n🔄 登入 {} ...", options.email);
    let user = adapter.log_in(&options.email, &options.password).await?;
    println!("  - user id: {}", user.id);

    let dashboards = adapter.list_dashboards().await?;
    println!("📊 Dashboards: {} 筆", dashboards.len());
    for id in &dashboards {
        let dashboard = adapter.get_dashboard(id).await?;
        println!("  - {}: {} (v{})", id, dashboard.name, dashboard.version);
    }

    let locations = adapter.list_locations().await?;
    println!("📂 Locations: {} 筆", locations.len());
    for location in &locations {
        let children = location.children.as_ref().map(|c| c.len()).unwrap_or(0);
        println!("  - {} ({} children)", location.id, children);
    }

    let roles = adapter.list_roles().await?;
    println!("👥 Roles: {} 筆", roles.len());
    for role in &roles {
        println!("  - {}: {}", role.id, role.name);
    }

    let users = adapter.list_users().await?;
    println!("👤 Other users: {} 筆", users.len());

    adapter.log_out().await?;
    println!("🔒 已登出");

    Ok(())
}
