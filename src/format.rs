use std::io::{self, Write};

use crate::entry::{DecodedEntry, MessageSeqId};
use crate::segment::Segment;
use crate::walker::Sink;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable blocks, one per message.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Renders delivered entries to a writer.
pub struct MessageFormatter<W> {
    out: W,
    format: OutputFormat,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    index: u64,
    seq_id: u64,
    msg_id: String,
    src_region: Option<&'a str>,
    body: Option<String>,
}

impl<W: Write> MessageFormatter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, entry: &DecodedEntry) -> io::Result<()> {
        let msg_id = format_msg_id(&entry.message.msg_id);
        writeln!(self.out, "---------- MSGID={} ----------", msg_id)?;
        writeln!(self.out, "MsgId:     {}", msg_id)?;
        writeln!(
            self.out,
            "SrcRegion: {}",
            entry.message.src_region.as_deref().unwrap_or("N/A")
        )?;
        writeln!(self.out, "Message:")?;
        writeln!(self.out)?;
        match &entry.message.body {
            Some(body) => writeln!(self.out, "{}", String::from_utf8_lossy(body))?,
            None => writeln!(self.out, "N/A")?,
        }
        writeln!(self.out)
    }

    fn write_json(&mut self, entry: &DecodedEntry) -> io::Result<()> {
        let json = JsonEntry {
            index: entry.index,
            seq_id: entry.seq_id,
            msg_id: format_msg_id(&entry.message.msg_id),
            src_region: entry.message.src_region.as_deref(),
            body: entry
                .message
                .body
                .as_ref()
                .map(|b| String::from_utf8_lossy(b).into_owned()),
        };
        serde_json::to_writer(&mut self.out, &json)?;
        writeln!(self.out)
    }
}

impl<W: Write> Sink for MessageFormatter<W> {
    fn begin_segment(&mut self, segment: &Segment) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(
                self.out,
                "\n>>>>> Segment {} [ {} ~ {} ] <<<<<\n",
                segment.id, segment.start, segment.end
            ),
            OutputFormat::Json => Ok(()),
        }
    }

    fn deliver(&mut self, entry: DecodedEntry) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(&entry),
            OutputFormat::Json => self.write_json(&entry),
        }
    }
}

/// `LOCAL(n)` for locally sequenced messages, otherwise `REMOTE(region[n],...)`.
pub fn format_msg_id(msg_id: &MessageSeqId) -> String {
    match msg_id.local {
        Some(local) => format!("LOCAL({})", local),
        None => {
            let remote: Vec<_> = msg_id
                .remote
                .iter()
                .map(|r| format!("{}[{}]", r.region, r.seq_id))
                .collect();
            format!("REMOTE({})", remote.join(","))
        }
    }
}
