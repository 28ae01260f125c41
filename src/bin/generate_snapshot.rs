//! Writes a deterministic five-dataset demo snapshot under `demo_data/`,
//! in the same physical layout the scoring pipeline publishes: Spark-style
//! partitioned directories (with `_SUCCESS` sentinels) for the CSV outputs
//! and flat files for the parquet ones. Open it in the app via
//! File → Open local snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use sha2::{Digest, Sha256};

const INDUSTRY_FLAGS: [&str; 12] = [
    "ind_ai",
    "ind_software",
    "ind_it",
    "ind_saas",
    "ind_healthcare",
    "ind_fintech",
    "ind_financial",
    "ind_ml",
    "ind_manufacturing",
    "ind_biotech",
    "ind_genai",
    "ind_devtools",
];

const SIGNALS: [&str; 5] = [
    "signal_job_posting",
    "signal_funding_recency",
    "signal_headcount_proxy",
    "signal_github_activity",
    "signal_company_trajectory",
];

const NAME_PREFIXES: [&str; 16] = [
    "Quanta", "Nimbus", "Vertex", "Orbit", "Lumen", "Forge", "Cobalt", "Atlas", "Helix", "Vector",
    "Summit", "Ridge", "Nova", "Pulse", "Cipher", "Beacon",
];

const NAME_SUFFIXES: [&str; 10] = [
    "Labs", "AI", "Systems", "Works", "Health", "Robotics", "Analytics", "Cloud", "Bio", "Data",
];

const CITIES: [(&str, &str, &str); 8] = [
    ("San Francisco", "CA", "USA"),
    ("New York", "NY", "USA"),
    ("Austin", "TX", "USA"),
    ("Boston", "MA", "USA"),
    ("Seattle", "WA", "USA"),
    ("London", "England", "UK"),
    ("Berlin", "BE", "Germany"),
    ("Toronto", "ON", "Canada"),
];

const INVESTORS: [&str; 8] = [
    "Sequoia Capital",
    "a16z",
    "Index Ventures",
    "Accel",
    "Lightspeed",
    "Benchmark",
    "First Round",
    "Y Combinator",
];

const EMPLOYEE_BUCKETS: [&str; 5] = ["1-10", "11-50", "51-200", "201-500", "501-1000"];

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

    fn pick(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Company {
    id: String,
    name: String,
    hiring_score: f64,
    hiring_rank: i64,
    momentum_score: f64,
    momentum_rank: i64,
    funding_stage: f64,
    flags: [f64; 12],
    signals: [f64; 5],
    has_job_postings: bool,
    github_stars: f64,
    num_job_postings: f64,
    city: usize,
    total_funding_usd: Option<f64>,
    num_investors: i64,
    employees: usize,
    founded_year: i64,
}

fn tier(score: f64, hi: f64) -> &'static str {
    let normalized = score / hi * 100.0;
    match normalized {
        n if n >= 80.0 => "Very High",
        n if n >= 60.0 => "High",
        n if n >= 40.0 => "Moderate",
        n if n >= 20.0 => "Low",
        _ => "Very Low",
    }
}

fn generate_companies(rng: &mut SimpleRng) -> Vec<Company> {
    let mut companies = Vec::new();
    for (i, prefix) in NAME_PREFIXES.iter().enumerate() {
        for (j, suffix) in NAME_SUFFIXES.iter().enumerate() {
            let n = i * NAME_SUFFIXES.len() + j;
            let hiring_score = rng.gauss(55.0, 20.0).clamp(1.0, 99.0);
            let momentum_score =
                (hiring_score / 100.0 * 0.6 + rng.next_f64() * 0.4).clamp(0.01, 0.99);

            let mut flags = [0.0; 12];
            for _ in 0..1 + rng.pick(3) {
                flags[rng.pick(INDUSTRY_FLAGS.len())] = 1.0;
            }

            let signals: [f64; 5] =
                std::array::from_fn(|_| rng.gauss(hiring_score, 12.0).clamp(0.0, 100.0));
            let stage = rng.pick(5) as f64;
            let funding = if rng.next_f64() < 0.08 {
                None
            } else {
                let scale = rng.gauss(1.0, 0.4).clamp(0.2, 2.5);
                Some(((stage + 1.0) * scale).powi(2) * 500_000.0)
            };

            companies.push(Company {
                id: format!("cmp_{n:04}"),
                name: format!("{prefix} {suffix}"),
                hiring_score,
                hiring_rank: 0,
                momentum_score,
                momentum_rank: 0,
                funding_stage: stage,
                flags,
                signals,
                has_job_postings: signals[0] > 45.0,
                github_stars: (rng.next_f64() * 12.0).exp2().floor(),
                num_job_postings: if signals[0] > 45.0 {
                    (signals[0] / 10.0).floor()
                } else {
                    0.0
                },
                city: rng.pick(CITIES.len()),
                total_funding_usd: funding,
                num_investors: 1 + rng.pick(6) as i64,
                employees: rng.pick(EMPLOYEE_BUCKETS.len()),
                founded_year: 2008 + rng.pick(16) as i64,
            });
        }
    }

    // Dense ranks, best score first.
    let mut order: Vec<usize> = (0..companies.len()).collect();
    order.sort_by(|&a, &b| companies[b].hiring_score.total_cmp(&companies[a].hiring_score));
    for (rank, &idx) in order.iter().enumerate() {
        companies[idx].hiring_rank = rank as i64 + 1;
    }
    order.sort_by(|&a, &b| companies[b].momentum_score.total_cmp(&companies[a].momentum_score));
    for (rank, &idx) in order.iter().enumerate() {
        companies[idx].momentum_rank = rank as i64 + 1;
    }
    companies
}

/// `<key>/part-00000-<hash>.csv` plus an empty `_SUCCESS` sentinel, the way
/// a partitioned pipeline write lands.
fn partitioned_csv_path(root: &Path, key: &str) -> PathBuf {
    let dir = root.join(key);
    fs::create_dir_all(&dir).expect("creating dataset directory");
    fs::write(dir.join("_SUCCESS"), b"").expect("writing sentinel");
    let hash = hex::encode(&Sha256::digest(key.as_bytes())[..4]);
    dir.join(format!("part-00000-{hash}.csv"))
}

fn write_scores(root: &Path, companies: &[Company]) {
    let path = partitioned_csv_path(root, "modeling/company_scores.csv");
    let mut writer = csv::Writer::from_path(&path).expect("opening scores csv");
    writer
        .write_record([
            "company_id",
            "momentum_score",
            "momentum_tier",
            "momentum_rank",
            "funding_stage",
        ])
        .expect("writing header");
    for (i, company) in companies.iter().enumerate() {
        // A few companies are missing from scores so the dashboard's
        // null-tolerant joins have something to chew on.
        if i % 23 == 11 {
            continue;
        }
        writer
            .write_record([
                company.id.clone(),
                format!("{:.4}", company.momentum_score),
                tier(company.momentum_score, 1.0).to_string(),
                company.momentum_rank.to_string(),
                format!("{:.1}", company.funding_stage),
            ])
            .expect("writing scores row");
    }
    writer.flush().expect("flushing scores csv");
}

fn write_hiring(root: &Path, companies: &[Company]) {
    let path = partitioned_csv_path(root, "modeling/hiring_friendliness_scores.csv");
    let mut writer = csv::Writer::from_path(&path).expect("opening hiring csv");
    writer
        .write_record(["company_id", "name", "hiring_score", "hiring_tier", "hiring_rank"])
        .expect("writing header");
    for (i, company) in companies.iter().enumerate() {
        let name = if i % 31 == 7 { "" } else { company.name.as_str() };
        writer
            .write_record([
                company.id.clone(),
                name.to_string(),
                format!("{:.2}", company.hiring_score),
                tier(company.hiring_score, 100.0).to_string(),
                company.hiring_rank.to_string(),
            ])
            .expect("writing hiring row");
    }
    writer.flush().expect("flushing hiring csv");
}

fn feature_columns(companies: &[Company]) -> Vec<(String, Vec<f64>)> {
    let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
    for (flag_idx, flag) in INDUSTRY_FLAGS.iter().enumerate() {
        columns.push((
            flag.to_string(),
            companies.iter().map(|c| c.flags[flag_idx]).collect(),
        ));
    }
    for (signal_idx, signal) in SIGNALS.iter().enumerate() {
        columns.push((
            signal.to_string(),
            companies.iter().map(|c| c.signals[signal_idx]).collect(),
        ));
    }
    columns.push((
        "github_stars".to_string(),
        companies.iter().map(|c| c.github_stars).collect(),
    ));
    columns.push((
        "num_job_postings".to_string(),
        companies.iter().map(|c| c.num_job_postings).collect(),
    ));
    columns
}

fn write_features(root: &Path, companies: &[Company]) {
    let numeric = feature_columns(companies);

    let mut fields = vec![Field::new("company_id", DataType::Utf8, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        companies.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
    ))];
    for (name, values) in &numeric {
        fields.push(Field::new(name, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(values.clone())));
    }
    fields.push(Field::new("has_job_postings", DataType::Boolean, true));
    arrays.push(Arc::new(BooleanArray::from(
        companies.iter().map(|c| c.has_job_postings).collect::<Vec<_>>(),
    )));

    write_parquet(&root.join("modeling/features.parquet"), fields, arrays);
}

fn write_metadata(root: &Path, companies: &[Company]) {
    let path = partitioned_csv_path(root, "modeling/feature_metadata.csv");
    let mut writer = csv::Writer::from_path(&path).expect("opening metadata csv");
    writer
        .write_record(["feature_name", "group", "mean", "min", "max"])
        .expect("writing header");

    let mut describe = |name: &str, group: &str, values: &[f64]| {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        writer
            .write_record([
                name.to_string(),
                group.to_string(),
                format!("{mean:.4}"),
                format!("{min:.4}"),
                format!("{max:.4}"),
            ])
            .expect("writing metadata row");
    };

    for (name, values) in feature_columns(companies) {
        let group = if name.starts_with("ind_") {
            "industry"
        } else if name.starts_with("signal_") {
            "signals"
        } else {
            "activity"
        };
        describe(&name, group, &values);
    }
    let postings: Vec<f64> = companies
        .iter()
        .map(|c| if c.has_job_postings { 1.0 } else { 0.0 })
        .collect();
    describe("has_job_postings", "activity", &postings);
    writer.flush().expect("flushing metadata csv");
}

fn write_spine(root: &Path, companies: &[Company]) {
    let industries_text = |c: &Company| -> String {
        let labels: Vec<&str> = INDUSTRY_FLAGS
            .iter()
            .zip(c.flags)
            .filter(|(_, flag)| *flag == 1.0)
            .map(|(name, _)| name.trim_start_matches("ind_"))
            .collect();
        labels.join("; ")
    };
    let slug = |c: &Company| c.name.to_lowercase().replace(' ', "");

    let ids: Vec<&str> = companies.iter().map(|c| c.id.as_str()).collect();
    let names: Vec<String> = companies.iter().map(|c| c.name.clone()).collect();
    let cities: Vec<&str> = companies.iter().map(|c| CITIES[c.city].0).collect();
    let states: Vec<&str> = companies.iter().map(|c| CITIES[c.city].1).collect();
    let countries: Vec<&str> = companies.iter().map(|c| CITIES[c.city].2).collect();
    let hq: Vec<String> = companies
        .iter()
        .map(|c| format!("{}, {}", CITIES[c.city].0, CITIES[c.city].2))
        .collect();
    let industry_text: Vec<String> = companies.iter().map(industries_text).collect();
    let descriptions: Vec<String> = companies
        .iter()
        .map(|c| format!("{} builds tools for the {} market.", c.name, CITIES[c.city].2))
        .collect();
    let funding: Vec<Option<f64>> = companies.iter().map(|c| c.total_funding_usd).collect();
    let funding_dates: Vec<Option<String>> = companies
        .iter()
        .map(|c| {
            c.total_funding_usd
                .map(|_| format!("{}-{:02}-15", 2022 + c.founded_year % 3, 1 + c.founded_year % 12))
        })
        .collect();
    let funding_types: Vec<Option<String>> = companies
        .iter()
        .map(|c| {
            c.total_funding_usd.map(|_| {
                ["Pre-Seed", "Seed", "Series A", "Series B", "Post-IPO"][c.funding_stage as usize]
                    .to_string()
            })
        })
        .collect();
    let employees: Vec<&str> = companies.iter().map(|c| EMPLOYEE_BUCKETS[c.employees]).collect();
    let websites: Vec<String> = companies.iter().map(|c| format!("https://{}.example.com", slug(c))).collect();
    let linkedins: Vec<Option<String>> = companies
        .iter()
        .enumerate()
        .map(|(i, c)| {
            (i % 9 != 4).then(|| format!("https://linkedin.com/company/{}", slug(c)))
        })
        .collect();
    let investors: Vec<Option<String>> = companies
        .iter()
        .map(|c| {
            (c.num_investors > 0).then(|| {
                INVESTORS[..(c.num_investors as usize).min(3)].join("; ")
            })
        })
        .collect();
    let investor_counts: Vec<i64> = companies.iter().map(|c| c.num_investors).collect();
    let founded: Vec<String> = companies.iter().map(|c| format!("{}-01-01", c.founded_year)).collect();

    let fields = vec![
        Field::new("company_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("city", DataType::Utf8, true),
        Field::new("state", DataType::Utf8, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("hq_location", DataType::Utf8, true),
        Field::new("industries", DataType::Utf8, true),
        Field::new("description_combined", DataType::Utf8, true),
        Field::new("total_funding_usd", DataType::Float64, true),
        Field::new("last_funding_date", DataType::Utf8, true),
        Field::new("last_funding_type", DataType::Utf8, true),
        Field::new("num_employees", DataType::Utf8, true),
        Field::new("website", DataType::Utf8, true),
        Field::new("linkedin", DataType::Utf8, true),
        Field::new("top_investors", DataType::Utf8, true),
        Field::new("num_investors", DataType::Int64, true),
        Field::new("founded_date", DataType::Utf8, true),
    ];
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(names)),
        Arc::new(StringArray::from(cities)),
        Arc::new(StringArray::from(states)),
        Arc::new(StringArray::from(countries)),
        Arc::new(StringArray::from(hq)),
        Arc::new(StringArray::from(industry_text)),
        Arc::new(StringArray::from(descriptions)),
        Arc::new(Float64Array::from(funding)),
        Arc::new(StringArray::from(funding_dates)),
        Arc::new(StringArray::from(funding_types)),
        Arc::new(StringArray::from(employees)),
        Arc::new(StringArray::from(websites)),
        Arc::new(StringArray::from(linkedins)),
        Arc::new(StringArray::from(investors)),
        Arc::new(Int64Array::from(investor_counts)),
        Arc::new(StringArray::from(founded)),
    ];

    write_parquet(&root.join("cleaned/spine_cleaned.parquet"), fields, arrays);
}

fn write_parquet(path: &Path, fields: Vec<Field>, arrays: Vec<ArrayRef>) {
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).expect("building record batch");
    let file = std::fs::File::create(path).expect("creating parquet file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("creating parquet writer");
    writer.write(&batch).expect("writing parquet batch");
    writer.close().expect("closing parquet writer");
}

fn main() {
    let root = PathBuf::from("demo_data");
    fs::create_dir_all(root.join("modeling")).expect("creating modeling dir");
    fs::create_dir_all(root.join("cleaned")).expect("creating cleaned dir");

    let mut rng = SimpleRng::new(42);
    let companies = generate_companies(&mut rng);

    write_scores(&root, &companies);
    write_hiring(&root, &companies);
    write_features(&root, &companies);
    write_metadata(&root, &companies);
    write_spine(&root, &companies);

    println!(
        "Wrote snapshot with {} companies to {}",
        companies.len(),
        root.display()
    );
}
