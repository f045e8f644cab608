use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::print_batches;
use parquet::arrow::ArrowWriter;

const INDEX_OUTPUT: &str = "sample_index.parquet";
const INDUSTRY_OUTPUT: &str = "sample_industry.parquet";

const FIRST_YEAR: i64 = 2010;
const LAST_YEAR: i64 = 2023;
/// Industry classification only reaches this year, as in the real source.
const LAST_INDUSTRY_YEAR: i64 = 2021;

/// (code, name, industry code, industry name); `None` industries are left
/// out of the industry table entirely.
const COMPANIES: [(i64, &str, Option<(&str, &str)>); 6] = [
    (1, "平安银行", Some(("J66", "货币金融服务"))),
    (2, "万科A", Some(("K70", "房地产业"))),
    (63, "中兴通讯", Some(("C39", "计算机、通信和其他电子设备制造业"))),
    (858, "五粮液", Some(("C15", "酒、饮料和精制茶制造业"))),
    (300750, "宁德时代", None),
    (600519, "贵州茅台", Some(("C15", "酒、饮料和精制茶制造业"))),
];

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

    /// Uniform integer in `0..bound`.
    fn below(&mut self, bound: u64) -> i64 {
        (self.next_u64() % bound) as i64
    }
}

#[derive(Default)]
struct IndexColumns {
    code: Vec<i64>,
    name: Vec<String>,
    year: Vec<i64>,
    index: Vec<Option<f64>>,
    technology: Vec<Option<f64>>,
    application: Vec<Option<f64>>,
    total_words: Vec<i64>,
    ai_words: Vec<i64>,
    big_data_words: Vec<i64>,
    cloud_words: Vec<i64>,
}

impl IndexColumns {
    fn into_batch(self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("股票代码", DataType::Int64, false),
            Field::new("企业名称", DataType::Utf8, false),
            Field::new("年份", DataType::Int64, false),
            Field::new("数字化转型指数", DataType::Float64, true),
            Field::new("技术维度", DataType::Float64, true),
            Field::new("应用维度", DataType::Float64, true),
            Field::new("词总", DataType::Int64, false),
            Field::new("人工智能词频数", DataType::Int64, false),
            Field::new("大数据词频数", DataType::Int64, false),
            Field::new("云计算词频数", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(self.code)),
            Arc::new(StringArray::from(self.name)),
            Arc::new(Int64Array::from(self.year)),
            Arc::new(Float64Array::from(self.index)),
            Arc::new(Float64Array::from(self.technology)),
            Arc::new(Float64Array::from(self.application)),
            Arc::new(Int64Array::from(self.total_words)),
            Arc::new(Int64Array::from(self.ai_words)),
            Arc::new(Int64Array::from(self.big_data_words)),
            Arc::new(Int64Array::from(self.cloud_words)),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

#[derive(Default)]
struct IndustryColumns {
    code: Vec<String>,
    year: Vec<i64>,
    industry_code: Vec<String>,
    industry_name: Vec<String>,
}

impl IndustryColumns {
    fn into_batch(self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("股票代码全称", DataType::Utf8, false),
            Field::new("年度", DataType::Int64, false),
            Field::new("行业代码", DataType::Utf8, false),
            Field::new("行业名称", DataType::Utf8, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(self.code)),
            Arc::new(Int64Array::from(self.year)),
            Arc::new(StringArray::from(self.industry_code)),
            Arc::new(StringArray::from(self.industry_name)),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let mut index = IndexColumns::default();
    let mut industry = IndustryColumns::default();

    for (n, &(code, name, sector)) in COMPANIES.iter().enumerate() {
        // Later companies list later, so histories have different lengths.
        let listed = FIRST_YEAR + n as i64;
        let base = 0.5 + rng.next_f64() * 2.0;

        for year in listed..=LAST_YEAR {
            let trend = (year - listed) as f64 * 0.15;
            let technology = base * 0.4 + trend * 0.5 + rng.next_f64() * 0.2;
            let application = base * 0.6 + trend * 0.5 + rng.next_f64() * 0.2;

            // One gap year per company, to exercise null handling.
            let missing = year == listed + 2;
            let (ti, tech, app) = if missing {
                (None, None, None)
            } else {
                (Some(technology + application), Some(technology), Some(application))
            };

            let ai = rng.below(20) + (year - FIRST_YEAR);
            let big_data = rng.below(30);
            let cloud = rng.below(15);
            let total = ai + big_data + cloud + rng.below(200) + 50;

            index.code.push(code);
            index.name.push(name.to_string());
            index.year.push(year);
            index.index.push(ti);
            index.technology.push(tech);
            index.application.push(app);
            index.total_words.push(total);
            index.ai_words.push(ai);
            index.big_data_words.push(big_data);
            index.cloud_words.push(cloud);

            if let Some((industry_code, industry_name)) = sector {
                if year <= LAST_INDUSTRY_YEAR {
                    industry.code.push(format!("{code:06}"));
                    industry.year.push(year);
                    industry.industry_code.push(industry_code.to_string());
                    industry.industry_name.push(industry_name.to_string());
                }
            }
        }
    }

    let index_batch = index.into_batch()?;
    let industry_batch = industry.into_batch()?;

    write_parquet(Path::new(INDEX_OUTPUT), &index_batch)?;
    write_parquet(Path::new(INDUSTRY_OUTPUT), &industry_batch)?;

    print_batches(&[index_batch.slice(0, index_batch.num_rows().min(5))])?;
    println!(
        "Wrote {} index rows to {INDEX_OUTPUT} and {} industry rows to {INDUSTRY_OUTPUT}",
        index_batch.num_rows(),
        industry_batch.num_rows()
    );
    println!(
        "Point the dashboard at them with dti-dashboard.json:\n\
         {{ \"index_path\": \"{INDEX_OUTPUT}\", \"industry_path\": \"{INDUSTRY_OUTPUT}\" }}"
    );
    Ok(())
}
