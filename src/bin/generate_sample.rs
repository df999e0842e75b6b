use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A rating cell the way real exports look: mostly plain numbers, sometimes
/// annotated ("7.1 (S)"), sometimes a null sentinel.
fn rating_cell(rng: &mut SimpleRng, base: f64) -> String {
    let value = (rng.gauss(base, 0.6) * 10.0).round() / 10.0;
    match rng.below(10) {
        0 => "N.A.".to_string(),
        1 => format!("{value:.1} (S)"),
        _ => format!("{value:.1}"),
    }
}

fn gd_cell(rng: &mut SimpleRng) -> String {
    let value = rng.below(7) as i64 - 3;
    match rng.below(12) {
        0 => "-".to_string(),
        1 => format!("{value} (H)"),
        _ => value.to_string(),
    }
}

const HEADERS: [&str; 15] = [
    "Name",
    "Team Name",
    "Season",
    "Injury",
    "Age",
    "Date of Injury",
    "Date of return",
    "Match1_before_injury_Player_rating",
    "Match2_before_injury_Player_rating",
    "Match1_after_injury_Player_rating",
    "Match2_after_injury_Player_rating",
    "Match1_before_injury_GD",
    "Match2_before_injury_GD",
    "Match1_missed_match_GD",
    "Match2_missed_match_GD",
];

fn main() {
    let mut rng = SimpleRng::new(42);

    let players: [(&str, &str); 6] = [
        ("Bukayo Saka", "Arsenal"),
        ("Martin Odegaard", "Arsenal"),
        ("Mason Mount", "Chelsea"),
        ("Reece James", "Chelsea"),
        ("Marcus Rashford", "Manchester United"),
        ("Rodri", "Manchester City"),
    ];
    let seasons = ["2020/21", "2021/22", "2022/23"];
    let injuries = ["Hamstring", "Ankle sprain", "ACL rupture", "Calf strain"];

    // One row per (player, season) pair, with occasional gaps.
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (player, team) in &players {
        let base_rating = 6.0 + rng.next_f64() * 2.0;
        for season in &seasons {
            // Season label "2020/21" → campaign starting August 2020.
            let start_year: i32 = season[..4].parse().unwrap();
            let injury_date = NaiveDate::from_ymd_opt(start_year, 8, 1).unwrap()
                + Duration::days(rng.below(280) as i64);
            let return_date = injury_date + Duration::days(10 + rng.below(90) as i64);

            // Roughly one spell in eight has no recorded injury date.
            let injury_date_cell = if rng.below(8) == 0 {
                None
            } else {
                Some(injury_date.format("%Y-%m-%d").to_string())
            };

            let row: Vec<Option<String>> = vec![
                Some((*player).to_string()),
                Some((*team).to_string()),
                Some((*season).to_string()),
                Some(injuries[rng.below(injuries.len() as u64) as usize].to_string()),
                Some((20 + rng.below(15)).to_string()),
                injury_date_cell,
                Some(return_date.format("%Y-%m-%d").to_string()),
                Some(rating_cell(&mut rng, base_rating)),
                Some(rating_cell(&mut rng, base_rating)),
                Some(rating_cell(&mut rng, base_rating - 0.3)),
                Some(rating_cell(&mut rng, base_rating - 0.3)),
                Some(gd_cell(&mut rng)),
                Some(gd_cell(&mut rng)),
                Some(gd_cell(&mut rng)),
                Some(gd_cell(&mut rng)),
            ];
            rows.push(row);
        }
    }

    write_csv("sample_injuries.csv", &rows);
    write_parquet("sample_injuries.parquet", &rows);

    println!(
        "Wrote {} injury records to sample_injuries.csv and sample_injuries.parquet",
        rows.len()
    );
}

fn write_csv(path: &str, rows: &[Vec<Option<String>>]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer.write_record(HEADERS).expect("Failed to write header");
    for row in rows {
        let record: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &str, rows: &[Vec<Option<String>>]) {
    // Age as Int64, everything else as strings (the pipeline does the
    // numeric cleaning either way).
    let age_idx = HEADERS.iter().position(|h| *h == "Age").unwrap();

    let mut fields = Vec::new();
    for (i, name) in HEADERS.iter().enumerate() {
        let dtype = if i == age_idx {
            DataType::Int64
        } else {
            DataType::Utf8
        };
        fields.push(Field::new(*name, dtype, true));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = Vec::new();
    for (i, _) in HEADERS.iter().enumerate() {
        if i == age_idx {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|row| row[i].as_deref().and_then(|v| v.parse().ok()))
                .collect();
            columns.push(Arc::new(Int64Array::from(values)));
        } else {
            let values: Vec<Option<&str>> = rows.iter().map(|row| row[i].as_deref()).collect();
            columns.push(Arc::new(StringArray::from(values)));
        }
    }

    let batch =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}
