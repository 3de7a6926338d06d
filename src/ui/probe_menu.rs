//! Interactive HTTP request tester menu

use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

use super::{is_exit_command, Console};
use crate::probe::{
    parse_json_body, parse_json_pairs, ProbeBody, ProbeClient, ProbeRequest, ProbeResponse,
};

/// Runs the request tester until the user exits or input ends
pub async fn run_probe_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
) -> io::Result<()> {
    loop {
        console.header("HTTP REQUEST TESTER")?;
        console.line("1. GET request")?;
        console.line("2. POST request")?;
        console.line("3. Country information")?;
        console.line("4. Random dog")?;
        console.line("0. Exit")?;
        console.blank()?;

        let Some(choice) = console.prompt("Your choice: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => get_flow(console, client).await?,
            "2" => post_flow(console, client).await?,
            "3" => country_flow(console, client).await?,
            "4" => dog_flow(console, client).await?,
            other if is_exit_command(other) => return Ok(()),
            _ => console.error("invalid choice")?,
        }
    }
}

async fn get_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
) -> io::Result<()> {
    let Some(url) = read_url(console)? else {
        return Ok(());
    };
    let headers = read_pairs(console, "Headers (JSON object, Enter to skip): ")?;
    let query = read_pairs(console, "Query parameters (JSON object, Enter to skip): ")?;

    let request = ProbeRequest::get(url).with_headers(headers).with_query(query);
    send_and_render(console, client, &request).await
}

async fn post_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
) -> io::Result<()> {
    let Some(url) = read_url(console)? else {
        return Ok(());
    };
    let Some(kind) = console.prompt("Body type (1 - JSON, 2 - form data): ")? else {
        return Ok(());
    };
    let headers = read_pairs(console, "Headers (JSON object, Enter to skip): ")?;

    let body = match kind.as_str() {
        "1" => {
            let Some(input) = console.prompt("JSON body: ")? else {
                return Ok(());
            };
            match parse_json_body(&input) {
                Ok(Some(value)) => ProbeBody::Json(value),
                Ok(None) => ProbeBody::Empty,
                Err(e) => return console.error(e),
            }
        }
        "2" => {
            let Some(input) = console.prompt("Form fields (JSON object): ")? else {
                return Ok(());
            };
            match parse_json_pairs(&input) {
                Ok(fields) if fields.is_empty() => ProbeBody::Empty,
                Ok(fields) => ProbeBody::Form(fields),
                Err(e) => return console.error(e),
            }
        }
        _ => return console.error("invalid body type"),
    };

    let request = ProbeRequest::post(url).with_headers(headers).with_body(body);
    send_and_render(console, client, &request).await
}

async fn country_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
) -> io::Result<()> {
    let Some(name) = console.prompt("Country name: ")? else {
        return Ok(());
    };
    if name.is_empty() {
        return console.error("country name must not be empty");
    }

    console.section(&format!("GET country '{name}'"))?;
    match client.country(&name).await {
        Ok(response) => render_response(console, &response),
        Err(e) => console.error(e),
    }
}

async fn dog_flow<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
) -> io::Result<()> {
    console.section("RANDOM DOG")?;
    match client.random_dog().await {
        Ok(dog) => {
            console.line(format!("{} {}", "Status:".green(), "success"))?;
            console.line("Image link:")?;
            console.line(dog.url.as_str().cyan())?;
            console.blank()
        }
        Err(e) => console.error(e),
    }
}

fn read_url<R: BufRead, W: Write>(console: &mut Console<R, W>) -> io::Result<Option<String>> {
    let Some(url) = console.prompt("URL: ")? else {
        return Ok(None);
    };
    if url.is_empty() {
        console.error("URL must not be empty")?;
        return Ok(None);
    }
    Ok(Some(url))
}

/// Reads optional key/value pairs; unparsable input is reported and ignored
fn read_pairs<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    message: &str,
) -> io::Result<Vec<(String, String)>> {
    let Some(input) = console.prompt(message)? else {
        return Ok(Vec::new());
    };
    match parse_json_pairs(&input) {
        Ok(pairs) => Ok(pairs),
        Err(e) => {
            console.error(format!("{e}; sending without them"))?;
            Ok(Vec::new())
        }
    }
}

async fn send_and_render<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    client: &ProbeClient,
    request: &ProbeRequest,
) -> io::Result<()> {
    console.section(&format!("{} {}", request.method, request.url))?;
    if !request.query.is_empty() {
        console.line(format!("Query: {:?}", request.query))?;
    }
    if !request.headers.is_empty() {
        console.line(format!("Headers: {:?}", request.headers))?;
    }
    match &request.body {
        ProbeBody::Empty => {}
        ProbeBody::Json(value) => console.line(format!("JSON body: {value}"))?,
        ProbeBody::Form(fields) => console.line(format!("Form body: {fields:?}"))?,
    }

    match client.send(request).await {
        Ok(response) => render_response(console, &response),
        Err(e) => console.error(e),
    }
}

fn render_response<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    response: &ProbeResponse,
) -> io::Result<()> {
    let status = response.status.to_string();
    let status = if (200..300).contains(&response.status) {
        status.green()
    } else {
        status.red()
    };
    console.line(format!("Status: {status}"))?;
    console.line("Response headers:")?;
    for (name, value) in &response.headers {
        console.line(format!("  {}: {}", name.as_str().cyan(), value))?;
    }
    console.blank()?;
    console.line("Response body:")?;
    console.line(&response.body)?;
    console.blank()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{console, output};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_flow_prints_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/hello").header("x-token", "abc");
                then.status(200).json_body(json!({"greeting": "hi"}));
            })
            .await;

        let input = format!("1\n{}\n{{\"x-token\": \"abc\"}}\n\n0\n", server.url("/hello"));
        let mut c = console(&input);
        run_probe_menu(&mut c, &ProbeClient::new()).await.unwrap();
        let text = output(c);

        assert!(text.contains("GET"));
        assert!(text.contains("\"greeting\": \"hi\""));
    }

    #[tokio::test]
    async fn test_get_flow_ignores_bad_header_json() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/plain");
                then.status(200).body("plain text");
            })
            .await;

        let input = format!("1\n{}\n{{oops\n\n0\n", server.url("/plain"));
        let mut c = console(&input);
        run_probe_menu(&mut c, &ProbeClient::new()).await.unwrap();
        let text = output(c);

        assert!(text.contains("sending without them"));
        assert!(text.contains("plain text"));
    }

    #[tokio::test]
    async fn test_post_flow_invalid_json_body_aborts() {
        let input = "2\nhttp://127.0.0.1:9/never\n1\n\n{broken\n0\n";
        let mut c = console(input);
        run_probe_menu(&mut c, &ProbeClient::new()).await.unwrap();
        let text = output(c);

        assert!(text.contains("Invalid JSON"));
        assert!(!text.contains("Response body"));
    }

    #[tokio::test]
    async fn test_post_flow_sends_form() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/submit").body("name=Rex");
                then.status(201).body("stored");
            })
            .await;

        let input = format!("2\n{}\n2\n\n{{\"name\": \"Rex\"}}\n0\n", server.url("/submit"));
        let mut c = console(&input);
        run_probe_menu(&mut c, &ProbeClient::new()).await.unwrap();
        let text = output(c);

        mock.assert_async().await;
        assert!(text.contains("stored"));
    }

    #[tokio::test]
    async fn test_dog_flow_prints_link() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dog");
                then.status(200).json_body(json!({
                    "message": "https://images.dog.ceo/breeds/pug/2.jpg",
                    "status": "success"
                }));
            })
            .await;

        let client = ProbeClient::with_urls(server.url("/countries"), server.url("/dog"));
        let mut c = console("4\n0\n");
        run_probe_menu(&mut c, &client).await.unwrap();
        let text = output(c);

        assert!(text.contains("https://images.dog.ceo/breeds/pug/2.jpg"));
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let mut c = console("1\n\n0\n");
        run_probe_menu(&mut c, &ProbeClient::new()).await.unwrap();
        assert!(output(c).contains("URL must not be empty"));
    }
}
