//! Property-based tests for port, volume, and create-option tokens

use dkr::args::{OptionTree, PortBinding, Protocol, VolumeBinding};
use dkr::commands::image::with_default_tag;
use proptest::prelude::*;
use serde_json::Value;

fn protocol() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Tcp), Just(Protocol::Udp), Just(Protocol::Sctp)]
}

fn ipv4() -> impl Strategy<Value = String> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

/// Every well-formed port token parses to exactly the parts it was built from
#[test]
fn test_port_token_parts_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::option::of(ipv4()),
                proptest::option::of(any::<u16>()),
                any::<u16>(),
                protocol(),
            ),
            |(ip, host, guest, proto)| {
                let mut token = String::new();
                if let Some(ip) = &ip {
                    token.push_str(ip);
                    token.push(':');
                    if host.is_none() {
                        token.push(':');
                    }
                }
                if let Some(host) = host {
                    token.push_str(&format!("{}:", host));
                }
                token.push_str(&format!("{}/{}", guest, proto));

                let port: PortBinding = token.parse().unwrap();
                prop_assert_eq!(&port.ip, &ip);
                prop_assert_eq!(port.host_port, host);
                prop_assert_eq!(port.guest_port, guest);
                prop_assert_eq!(port.proto, proto);
                prop_assert_eq!(port.exposed_key(), format!("{}/{}", guest, proto));
                Ok(())
            },
        )
        .unwrap();
}

/// Tokens with non-numeric ports never parse
#[test]
fn test_port_rejects_non_numeric_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-z]{1,8}", |word| {
            prop_assert!(word.parse::<PortBinding>().is_err());
            let token = format!("8080:{}", word);
            prop_assert!(token.parse::<PortBinding>().is_err());
            Ok(())
        })
        .unwrap();
}

/// Volume tokens keep name and path; mode defaults to rw
#[test]
fn test_volume_token_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[a-z][a-z0-9_.-]{0,15}",
                "(/[a-z0-9_.-]{1,8}){1,4}",
                proptest::option::of(prop_oneof![Just("ro"), Just("rw"), Just("z")]),
            ),
            |(name, path, mode)| {
                let token = match mode {
                    Some(mode) => format!("{}:{}:{}", name, path, mode),
                    None => format!("{}:{}", name, path),
                };
                let volume: VolumeBinding = token.parse().unwrap();
                prop_assert_eq!(&volume.volume_name, &name);
                prop_assert_eq!(&volume.guest_mount_point, &path);
                prop_assert_eq!(volume.mode.as_str(), mode.unwrap_or("rw"));
                prop_assert_eq!(
                    volume.bind_spec(),
                    format!("{}:{}:{}", name, path, mode.unwrap_or("rw"))
                );

                let too_many = format!("{}:extra", volume.bind_spec());
                prop_assert!(too_many.parse::<VolumeBinding>().is_err());
                Ok(())
            },
        )
        .unwrap();
}

/// Dotted keys land at their nested path; the last token for a path wins
#[test]
fn test_option_tree_nesting_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec("[a-z_]{1,6}", 1..4),
                "[a-zA-Z0-9 ]{0,10}",
                any::<i32>(),
            ),
            |(segments, text, number)| {
                let key = segments.join(".");
                let tokens = vec![
                    format!("{}={}", key, text),
                    format!("{}:={}", key, number),
                ];
                let tree = OptionTree::parse(&tokens).unwrap();
                let path: Vec<&str> = segments.iter().map(String::as_str).collect();
                prop_assert_eq!(tree.get(&path), Some(&Value::from(number)));

                let first_only = OptionTree::parse(&tokens[..1]).unwrap();
                prop_assert_eq!(first_only.get(&path), Some(&Value::String(text.clone())));
                Ok(())
            },
        )
        .unwrap();
}

/// Default tagging is idempotent and never touches explicit tags or digests
#[test]
fn test_default_tag_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::option::of("[a-z]{1,8}\\.[a-z]{2,3}(:[0-9]{2,5})?"),
                "[a-z0-9]{1,10}(/[a-z0-9]{1,10}){0,2}",
            ),
            |(registry, repository)| {
                let name = match registry {
                    Some(registry) => format!("{}/{}", registry, repository),
                    None => repository,
                };
                let tagged = with_default_tag(&name);
                prop_assert_eq!(&tagged, &format!("{}:latest", name));
                prop_assert_eq!(with_default_tag(&tagged), tagged.clone());

                let digest = format!("{}@sha256:abcdef", name);
                prop_assert_eq!(with_default_tag(&digest), digest.clone());
                Ok(())
            },
        )
        .unwrap();
}
