//! Plain tables for container and image listings.

use crate::engine::{ContainerSummary, ImageSummary, PortSummary};
use chrono::Duration;
use comfy_table::presets::NOTHING;
use comfy_table::Table;

const CONTAINER_HEADERS: [&str; 7] = ["ID", "NAME", "IMAGE", "CMD", "CREATED", "STATUS", "PORTS"];
const IMAGE_HEADERS: [&str; 6] = ["ID", "REPO", "TAG", "CREATED", "SIZE", "VIRTUAL SIZE"];
const SHORT_ID: usize = 12;

pub fn format_container_table(containers: &[ContainerSummary], now: i64) -> String {
    let mut table = plain_table(&CONTAINER_HEADERS);
    for container in containers {
        let ports: Vec<String> = container.ports.iter().map(format_port).collect();
        table.add_row(vec![
            short_id(&container.id).to_string(),
            container.display_name().to_string(),
            container.image.clone(),
            container.command.clone(),
            relative_time(container.created, now),
            container.status.clone(),
            ports.join(", "),
        ]);
    }
    render(&table)
}

/// One row per repository tag; an untagged image still gets a `<none>` row.
pub fn format_image_table(images: &[ImageSummary], now: i64) -> String {
    let mut table = plain_table(&IMAGE_HEADERS);
    for image in images {
        let id = short_id(image.bare_id()).to_string();
        let created = relative_time(image.created, now);
        let size = human_size(image.size as f64);
        let virtual_size = human_size(image.virtual_size.unwrap_or(image.size) as f64);

        let untagged = ["<none>:<none>".to_string()];
        let tags = if image.repo_tags.is_empty() {
            &untagged[..]
        } else {
            &image.repo_tags[..]
        };
        for tag in tags {
            let (repo, tag) = split_tag(tag);
            table.add_row(vec![
                id.clone(),
                repo.to_string(),
                tag.to_string(),
                created.clone(),
                size.clone(),
                virtual_size.clone(),
            ]);
        }
    }
    render(&table)
}

/// `ip:public->private/type`, `ip:private/type` when unpublished, empty without a
/// private port.
pub fn format_port(port: &PortSummary) -> String {
    let ip = port
        .ip
        .as_deref()
        .map(|ip| format!("{}:", ip))
        .unwrap_or_default();
    let kind = port
        .kind
        .as_deref()
        .map(|kind| format!("/{}", kind))
        .unwrap_or_default();
    match (port.private_port, port.public_port) {
        (Some(private), Some(public)) => format!("{}{}->{}{}", ip, public, private, kind),
        (Some(private), None) => format!("{}{}{}", ip, private, kind),
        _ => String::new(),
    }
}

/// Decimal byte size with one fractional digit, e.g. `1.5 KB`.
pub fn human_size(bytes: f64) -> String {
    let mut num = bytes;
    for unit in ["", "K", "M", "G", "T", "P", "E", "Z"] {
        if num.abs() < 1000.0 {
            return format!("{:3.1} {}B", num, unit);
        }
        num /= 1000.0;
    }
    format!("{:.1} YiB", num)
}

/// Age of a unix timestamp relative to `now`, in its largest whole unit.
pub fn relative_time(created: i64, now: i64) -> String {
    let age = Duration::seconds(now.saturating_sub(created));
    if age.num_seconds() <= 0 {
        "just now".to_string()
    } else if age.num_minutes() == 0 {
        format!("{}s ago", age.num_seconds())
    } else if age.num_hours() == 0 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_days() == 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_weeks() == 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_days() < 365 {
        format!("{}w ago", age.num_weeks())
    } else {
        format!("{}y ago", age.num_days() / 365)
    }
}

fn plain_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(headers.to_vec());
    table
}

fn render(table: &Table) -> String {
    table
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

/// Split `repo:tag` on the last `:` that is not part of a registry host.
fn split_tag(reference: &str) -> (&str, &str) {
    match reference.rfind(':') {
        Some(idx) if !reference[idx + 1..].contains('/') => {
            (&reference[..idx], &reference[idx + 1..])
        }
        _ => (reference, ""),
    }
}
