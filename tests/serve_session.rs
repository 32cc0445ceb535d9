use std::sync::Arc;
use std::time::Duration;

use chain_flow::ChainConfig;
use host_dom::{ElementRef, MemoryPage, NodeSpec};
use langqueue_cli::cli::serve_lines;
use langqueue_controller::{Controller, SharedSettings};
use langqueue_core_types::AppSettings;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};

/// ChatGPT-like page whose send button clears the field and shows the stop
/// button for two seconds.
fn simulated_host() -> (Arc<MemoryPage>, ElementRef) {
    let page = Arc::new(MemoryPage::new("https://chatgpt.com/"));
    let input = page.insert(
        NodeSpec::rich_editable()
            .attr("role", "textbox")
            .matching(&[r#"div[contenteditable="true"][role="textbox"]"#]),
    );
    let send = page.insert(NodeSpec::button().matching(&[r#"button[data-testid="send-button"]"#]));
    let stop = page.insert(
        NodeSpec::button()
            .matching(&[r#"button[aria-label="Stop generating"]"#])
            .hidden(),
    );
    let hook_input = input.clone();
    page.on_click(move |dom, clicked| {
        if clicked == &send {
            dom.set_text(&hook_input, "");
            dom.show_for(&stop, Duration::from_secs(2));
        }
    });
    (page, input)
}

async fn next<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Value {
    let line = lines.next_line().await.unwrap().unwrap();
    serde_json::from_str(&line).unwrap()
}

#[tokio::test(start_paused = true)]
async fn json_lines_session() {
    let (page, input) = simulated_host();
    let controller = Controller::attach(
        page.clone(),
        SharedSettings::new(AppSettings::default()),
        ChainConfig::default(),
    )
    .await
    .unwrap();

    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let session = tokio::spawn(serve_lines(
        Arc::new(controller),
        BufReader::new(server_read),
        server_write,
        Duration::from_millis(500),
    ));

    let (client_read, mut client_write) = tokio::io::split(client);
    let mut lines = BufReader::new(client_read).lines();

    assert_eq!(next(&mut lines).await["type"], "TEXTAREA_READY");

    client_write
        .write_all(b"{\"type\":\"COMPAT_CHECK\"}\nnot json\n")
        .await
        .unwrap();
    let status = next(&mut lines).await;
    assert_eq!(status["type"], "COMPAT_STATUS");
    assert_eq!(status["payload"]["ready"], true);

    client_write
        .write_all(b"{\"type\":\"INJECT_PROMPT\",\"payload\":{\"content\":\"draft\"}}\n")
        .await
        .unwrap();
    let inject = next(&mut lines).await;
    assert_eq!(inject["type"], "INJECT_PROMPT_RESULT");
    assert_eq!(inject["payload"]["ok"], true);
    assert_eq!(page.text(&input).unwrap(), "draft\n");

    client_write
        .write_all(b"{\"type\":\"RUN_CHAIN\",\"payload\":{\"steps\":[{\"content\":\"go\"}]}}\n")
        .await
        .unwrap();
    let ack = next(&mut lines).await;
    assert_eq!(ack["type"], "RUN_CHAIN_RESULT");
    assert_eq!(ack["payload"]["ok"], true);

    let mut statuses = Vec::new();
    loop {
        let event = next(&mut lines).await;
        assert_eq!(event["type"], "CHAIN_PROGRESS");
        let status = event["payload"]["status"].as_str().unwrap().to_string();
        assert_eq!(event["payload"]["totalSteps"], 1);
        let done = status == "completed";
        statuses.push(status);
        if done {
            break;
        }
    }
    assert_eq!(
        statuses,
        vec!["starting", "sending", "awaiting_response", "completed"]
    );

    drop(client_write);
    session.await.unwrap().unwrap();
}
