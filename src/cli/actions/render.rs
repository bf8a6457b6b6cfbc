//! Plain-text views printed by the actions.

use crate::api::{
    admin::DashboardStats,
    logs::LogFilters,
    types::{AuditLogEntry, LogStats, LogsPage, Product, TwoFactorEnrollment, User},
};
use std::{collections::BTreeMap, fmt::Write};

const NONE: &str = "-";

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn user(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", user.id);
    let _ = writeln!(out, "username:    {}", user.username);
    let _ = writeln!(out, "email:       {}", user.email);
    let _ = writeln!(out, "role:        {}", user.role);
    let _ = writeln!(out, "2fa:         {}", yes_no(user.is_2fa_enabled));
    let _ = writeln!(out, "active:      {}", yes_no(user.is_active));
    let _ = writeln!(out, "blocked:     {}", yes_no(user.is_blocked));
    let _ = writeln!(out, "created:     {}", user.created_at);
    let _ = write!(
        out,
        "last login:  {}",
        user.last_login.as_deref().unwrap_or(NONE)
    );
    out
}

pub fn users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users".to_string();
    }

    let mut out = format!(
        "{:>5}  {:<20} {:<30} {:<6} {:<4} {:<7}",
        "ID", "USERNAME", "EMAIL", "ROLE", "2FA", "STATUS"
    );
    for user in users {
        let status = if user.is_blocked {
            "blocked"
        } else if user.is_active {
            "active"
        } else {
            "inactive"
        };
        let _ = write!(
            out,
            "\n{:>5}  {:<20} {:<30} {:<6} {:<4} {:<7}",
            user.id,
            user.username,
            user.email,
            user.role,
            yes_no(user.is_2fa_enabled),
            status
        );
    }
    out
}

pub fn product(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", product.name, product.id);
    let _ = writeln!(out, "category:  {}", product.category);
    let _ = writeln!(out, "price:     {:.2} ₽", product.price);
    let _ = writeln!(out, "in stock:  {}", yes_no(product.in_stock));
    if let Some(image) = &product.image_url {
        let _ = writeln!(out, "image:     {image}");
    }
    let _ = write!(out, "\n{}", product.description);
    out
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    let mut out = format!(
        "{:>5}  {:<32} {:<16} {:>10}  {}",
        "ID", "NAME", "CATEGORY", "PRICE", "STOCK"
    );
    for product in products {
        let _ = write!(
            out,
            "\n{:>5}  {:<32} {:<16} {:>10.2}  {}",
            product.id,
            product.name,
            product.category,
            product.price,
            if product.in_stock { "in stock" } else { "sold out" }
        );
    }
    out
}

pub fn enrollment(enrollment: &TwoFactorEnrollment) -> String {
    format!(
        "{}\n\nsecret:   {}\nqr code:  {}\n\nAdd the secret to your authenticator app, then run `optika 2fa verify <CODE>`.",
        enrollment.message, enrollment.secret, enrollment.qr_code
    )
}

pub fn log_entry(entry: &AuditLogEntry) -> String {
    let optional = |value: Option<&str>| value.unwrap_or(NONE).to_string();
    let target = match (&entry.target_table, entry.target_id) {
        (Some(table), Some(id)) => format!("{table}#{id}"),
        (Some(table), None) => table.clone(),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => NONE.to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "id:         {}", entry.id);
    let _ = writeln!(out, "timestamp:  {}", entry.timestamp);
    let _ = writeln!(out, "user:       {}", optional(entry.username.as_deref()));
    let _ = writeln!(out, "role:       {}", optional(entry.role.as_deref()));
    let _ = writeln!(out, "operation:  {}", entry.operation);
    let _ = writeln!(out, "status:     {}", entry.status);
    let _ = writeln!(out, "target:     {target}");
    let _ = writeln!(out, "ip:         {}", optional(entry.ip_address.as_deref()));
    let _ = write!(out, "details:    {}", optional(entry.details.as_deref()));
    out
}

pub fn logs(page: &LogsPage, filters: &LogFilters) -> String {
    let mut out = format!(
        "{:>6}  {:<19}  {:<16} {:<6} {:<22} {:<8} {}",
        "ID", "TIMESTAMP", "USER", "ROLE", "OPERATION", "STATUS", "IP"
    );
    for entry in &page.logs {
        let _ = write!(
            out,
            "\n{:>6}  {:<19}  {:<16} {:<6} {:<22} {:<8} {}",
            entry.id,
            entry.timestamp.chars().take(19).collect::<String>(),
            entry.username.as_deref().unwrap_or(NONE),
            entry.role.as_deref().unwrap_or(NONE),
            entry.operation,
            entry.status,
            entry.ip_address.as_deref().unwrap_or(NONE)
        );
    }
    let _ = write!(
        out,
        "\n\npage {} of {} ({} events)",
        filters.page,
        filters.total_pages(page.total).max(1),
        page.total
    );
    out
}

fn counts(out: &mut String, title: &str, counts: &BTreeMap<String, u64>) {
    let _ = write!(out, "\n{title}:");
    if counts.is_empty() {
        let _ = write!(out, " {NONE}");
        return;
    }

    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (key, count) in sorted {
        let _ = write!(out, "\n  {key:<24} {count}");
    }
}

pub fn log_stats(stats: &LogStats) -> String {
    let mut out = format!("total events: {}", stats.total_events);
    counts(&mut out, "by status", &stats.by_status);
    counts(&mut out, "top operations", &stats.top_operations);
    counts(&mut out, "top users", &stats.top_users);
    out
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "users:          {}", stats.total_users);
    let _ = writeln!(out, "  admins:       {}", stats.admins);
    let _ = writeln!(out, "  staff:        {}", stats.staff);
    let _ = writeln!(out, "  users:        {}", stats.regular_users);
    let _ = writeln!(out, "active:         {}", stats.active_users);
    let _ = writeln!(out, "with 2fa:       {}", stats.with_two_factor);
    let _ = write!(out, "\n{}", log_stats(&stats.logs));
    out
}
