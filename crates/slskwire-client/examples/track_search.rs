//! Search a gateway and print the results as they stream in.
//!
//! ```sh
//! cargo run --example track_search -- 127.0.0.1:2416 "the beatles"
//! ```

use slskwire_client::SlskClient;
use slskwire_transport::TcpTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:2416".to_string());
    let query = args.next().unwrap_or_else(|| "the beatles".to_string());

    let mut client = SlskClient::new(TcpTransport::new(addr));

    client.on_search_response(|response| {
        println!(
            "{}/{} results for {:?} (ticket {})",
            response.current_results, response.total_results, response.query, response.ticket
        );
        for track in &response.resultset {
            let duration = track
                .duration_display()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            println!(
                "  {} - {}{} [{} bytes]",
                track.username, track.filename, duration, track.filesize
            );
        }
        Ok(())
    });

    client.on_track_download_response(|info| {
        println!("download {}: {}", info.filename, info.status);
        Ok(())
    });

    client.on_error(|error| {
        let suffix = if error.fatal { " (fatal)" } else { "" };
        eprintln!("server error {}: {}{}", error.code, error.msg, suffix);
        Ok(())
    });

    client.connect()?;
    client.send_search_request(&query)?;
    client.run();

    Ok(())
}
