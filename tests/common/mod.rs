//! A scripted stand-in for the out-of-process PAC engine.
//!
//! Scripts are one directive per line instead of JavaScript:
//!
//! | directive              | engine behaviour                                   |
//! |------------------------|----------------------------------------------------|
//! | `alert <text>`         | `alert()`; `{host}` expands to the URL host        |
//! | `error <line> <text>`  | reports a script error                             |
//! | `dnsResolve <host>`    | host lookup, answer echoed back as an alert        |
//! | `dnsResolveEx <host>`  | same, all address families                         |
//! | `myIpAddress`          | local address query, answer echoed as an alert     |
//! | `myIpAddressEx`        | same, all addresses                                |
//! | `return <pac result>`  | reports success                                    |
//! | `function FindProxyForURL(url, host) { return "<pac result>"; }` | same as `return` |
//! | `fail <code>`          | reports a net error code                           |
//! | `disconnect`           | drops the request client without a result          |
//! | `hang`                 | waits until the caller goes away                   |
//! | `hangFor <host>`       | `hang`, but only for requests to `<host>`          |
//! | `throw ...`            | compile error at creation                          |
//! | `abandon`              | creation client dropped without a result           |
//! | `stall`                | creation never answered                            |
//! | `crash`                | the resolver instance exits on its first request   |

#![allow(dead_code)]

use pacbridge::base::neterror::NetError;
use pacbridge::proxy_resolution::mojom::{
    self, ClientEvent, DnsRequest, FactoryCall, PendingReceiver, ProxyResolveDnsOperation, Remote,
    ResolverCall, ResolverRequestClient,
};
use pacbridge::proxy_resolution::{PacFileData, ProxyInfo};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

/// Starts an engine and returns the remote end of its factory endpoint.
pub fn spawn_engine() -> Remote<FactoryCall> {
    let (remote, receiver) = mojom::pipe();
    tokio::spawn(serve_factory(receiver));
    remote
}

pub fn script(lines: &[&str]) -> PacFileData {
    PacFileData::from_utf8(lines.join("\n"))
}

pub fn url(spec: &str) -> Url {
    Url::parse(spec).unwrap()
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn serve_factory(mut calls: PendingReceiver<FactoryCall>) {
    let mut stalled = Vec::new();
    while let Some(FactoryCall::CreateResolver {
        pac_script,
        resolver,
        client,
    }) = calls.recv().await
    {
        if pac_script.lines().any(|line| line.trim() == "abandon") {
            continue;
        }
        if pac_script.lines().any(|line| line.trim() == "stall") {
            stalled.push((resolver, client));
            continue;
        }
        if let Some((line_number, message)) = compile_error(&pac_script) {
            let _ = client.send(ClientEvent::OnError {
                line_number,
                message,
            });
            let _ = client.send(ClientEvent::ReportResult(Err(NetError::PacScriptFailed)));
            continue;
        }
        let _ = client.send(ClientEvent::Alert("compiled".to_string()));
        tokio::spawn(serve_resolver(pac_script, resolver));
        let _ = client.send(ClientEvent::ReportResult(Ok(())));
    }
}

fn compile_error(script: &str) -> Option<(i32, String)> {
    script
        .lines()
        .enumerate()
        .find(|(_, line)| line.trim_start().starts_with("throw"))
        .map(|(index, line)| (index as i32 + 1, format!("Uncaught {}", line.trim())))
}

async fn serve_resolver(script: String, mut calls: PendingReceiver<ResolverCall>) {
    while let Some(ResolverCall::GetProxyForUrl { url, client }) = calls.recv().await {
        if script.trim() == "crash" {
            return;
        }
        tokio::spawn(run_script(script.clone(), url, client));
    }
}

async fn run_script(script: String, url: Url, client: ResolverRequestClient) {
    let host = url.host_str().unwrap_or_default().to_string();
    for line in script.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(result) = literal_return(line) {
            let _ = client.send(ClientEvent::ReportResult(Ok(ProxyInfo::from_pac_string(
                result,
            ))));
            return;
        }
        let (directive, arg) = line.split_once(' ').unwrap_or((line, ""));
        match directive {
            "alert" => {
                let _ = client.send(ClientEvent::Alert(arg.replace("{host}", &host)));
            }
            "error" => {
                let (line_number, message) = arg.split_once(' ').unwrap_or((arg, ""));
                let _ = client.send(ClientEvent::OnError {
                    line_number: line_number.parse().unwrap_or(-1),
                    message: message.to_string(),
                });
            }
            "dnsResolve" | "dnsResolveEx" | "myIpAddress" | "myIpAddressEx" => {
                let operation = match directive {
                    "dnsResolve" => ProxyResolveDnsOperation::DnsResolve,
                    "dnsResolveEx" => ProxyResolveDnsOperation::DnsResolveEx,
                    "myIpAddress" => ProxyResolveDnsOperation::MyIpAddress,
                    _ => ProxyResolveDnsOperation::MyIpAddressEx,
                };
                let (request, answer) = DnsRequest::new(arg, operation);
                if client.send(ClientEvent::ResolveDns(request)).is_err() {
                    return;
                }
                let text = match answer.await {
                    Ok(Ok(addrs)) => join(&addrs),
                    Ok(Err(e)) => format!("error {}", e.as_i32()),
                    Err(_) => return,
                };
                let _ = client.send(ClientEvent::Alert(format!("{line} = {text}")));
            }
            "return" => {
                let _ = client.send(ClientEvent::ReportResult(Ok(ProxyInfo::from_pac_string(
                    arg,
                ))));
                return;
            }
            "fail" => {
                let code = arg.parse().unwrap_or(-2);
                let _ = client.send(ClientEvent::ReportResult(Err(NetError::from(code))));
                return;
            }
            "disconnect" => return,
            "hang" => {
                client.closed().await;
                return;
            }
            "hangFor" if arg == host => {
                client.closed().await;
                return;
            }
            "hangFor" => {}
            other => panic!("unknown directive {other:?}"),
        }
    }
}

/// The string literal returned by a one-line `FindProxyForURL` definition.
fn literal_return(line: &str) -> Option<&str> {
    let body = line.strip_prefix("function FindProxyForURL")?;
    let (_, rest) = body.split_once("return")?;
    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    rest[1..].split_once(quote).map(|(literal, _)| literal)
}

fn join(addrs: &[IpAddr]) -> String {
    addrs
        .iter()
        .map(IpAddr::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
