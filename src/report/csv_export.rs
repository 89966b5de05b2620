use super::model::PacketRow;
use crate::core::error::AnalysisResult;
use crate::network::packet::PacketRecord;
use csv::WriterBuilder;
use log::debug;
use std::io::Write;

// レコードがなくてもヘッダー行は出力する
pub fn write_csv<W: Write>(records: &[PacketRecord], writer: W) -> AnalysisResult<usize> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(PacketRow::HEADERS)?;

    for record in records {
        csv_writer.serialize(PacketRow::from_record(record))?;
    }
    csv_writer.flush()?;

    debug!("CSV出力: {} 行", records.len());
    Ok(records.len())
}

pub fn to_csv_string(records: &[PacketRecord]) -> AnalysisResult<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
