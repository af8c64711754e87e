use super::{DataSource, ModeRequest};
use crate::error::AppResult;
use crate::types::{ChatMode, ExpertiseLevel};
use async_trait::async_trait;

/// Built-in replies used when no live API is configured or reachable.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleSource;

impl SampleSource {
    pub fn reply_for(&self, request: &ModeRequest) -> String {
        match request.mode {
            ChatMode::GeneralSearch => general_search(&request.prompt, request.level),
            ChatMode::PartRecommendation => PART_RECOMMENDATION.to_string(),
            ChatMode::BuildRecommendation => BUILD_RECOMMENDATION.to_string(),
            ChatMode::CompatibilityCheck => COMPATIBILITY_CHECK.to_string(),
            ChatMode::SpecUpgrade => SPEC_UPGRADE.to_string(),
            ChatMode::BuildEvaluation => BUILD_EVALUATION.to_string(),
        }
    }
}

#[async_trait]
impl DataSource for SampleSource {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn respond(&self, request: &ModeRequest) -> AppResult<String> {
        Ok(self.reply_for(request))
    }
}

fn general_search(prompt: &str, level: ExpertiseLevel) -> String {
    let topic = prompt.trim();
    let heading = if topic.is_empty() {
        "## PC hardware basics".to_string()
    } else {
        format!("## About: {topic}")
    };
    let body = match level {
        ExpertiseLevel::Beginner => {
            "A PC is built around a **CPU** (the brain), a **GPU** (graphics), **RAM** (short-term memory) \
             and an **SSD** (storage). The motherboard connects everything and the power supply feeds it.\n\n\
             - Start from your budget and what you want to run.\n\
             - Spend the most on the GPU for gaming, on the CPU for editing and compiling.\n\
             - 32GB of RAM and a 1TB NVMe SSD are comfortable defaults today."
        }
        ExpertiseLevel::Intermediate => {
            "| Workload | Prioritise | Notes |\n|---|---|---|\n\
             | 1440p gaming | GPU | 12GB+ VRAM ages better |\n\
             | Video editing | CPU, RAM | 8+ cores, 32-64GB |\n\
             | Streaming | CPU or NVENC | Hardware encoders are cheap now |\n\n\
             Check socket (AM5 / LGA1700), memory generation (DDR5) and PSU headroom (~30%) before buying."
        }
        ExpertiseLevel::Expert => {
            "- AM5 boards guarantee a longer upgrade path than LGA1700.\n\
             - DDR5-6000 CL30 is the practical sweet spot for Ryzen 7000 (1:1 FCLK ratio).\n\
             - ATX 3.0 PSUs with a native 12V-2x6 lead avoid adapter issues on high-end GPUs.\n\
             - PCIe 5.0 SSDs rarely matter for games; spend the difference on the GPU."
        }
    };
    format!("{heading}\n\n{body}")
}

const PART_RECOMMENDATION: &str = r#"{
  "part_type": "gpu",
  "recommendations": [
    {
      "name": "NVIDIA GeForce RTX 4060 8GB",
      "price": "₩399,000",
      "specs": "3072 CUDA cores, 8GB GDDR6, 115W",
      "reason": "Best value for 1080p high settings with DLSS 3.",
      "link": "https://www.nvidia.com/en-us/geforce/graphics-cards/40-series/rtx-4060-4060ti/",
      "image": ""
    },
    {
      "name": "AMD Radeon RX 7700 XT 12GB",
      "price": "₩569,000",
      "specs": "3456 stream processors, 12GB GDDR6, 245W",
      "reason": "More VRAM for 1440p and future titles.",
      "link": "https://www.amd.com/en/products/graphics/desktops/radeon/7000-series/amd-radeon-rx-7700-xt.html",
      "image": ""
    },
    {
      "name": "NVIDIA GeForce RTX 4070 SUPER 12GB",
      "price": "₩859,000",
      "specs": "7168 CUDA cores, 12GB GDDR6X, 220W",
      "reason": "High-refresh 1440p with room for ray tracing.",
      "link": "https://www.nvidia.com/en-us/geforce/graphics-cards/40-series/rtx-4070-family/",
      "image": ""
    }
  ],
  "summary": "For a 1080p monitor the RTX 4060 is enough; step up to the RX 7700 XT if you plan to move to 1440p."
}"#;

const BUILD_RECOMMENDATION: &str = r#"{
  "title": "1440p gaming build",
  "parts": {
    "cpu": {
      "name": "AMD Ryzen 5 7600",
      "price": "₩259,000",
      "specs": "6 cores / 12 threads, up to 5.1GHz, AM5",
      "reason": "Strong gaming performance with an upgrade path on AM5.",
      "link": "",
      "image": ""
    },
    "motherboard": {
      "name": "MSI PRO B650M-A WIFI",
      "price": "₩219,000",
      "specs": "mATX, DDR5, PCIe 4.0, Wi-Fi 6E",
      "reason": "Solid VRM and wireless networking at a fair price.",
      "link": "",
      "image": ""
    },
    "memory": {
      "name": "DDR5-6000 CL30 32GB (2x16GB)",
      "price": "₩139,000",
      "specs": "EXPO, 1.35V",
      "reason": "Sweet-spot speed for Ryzen 7000.",
      "link": "",
      "image": ""
    },
    "gpu": {
      "name": "AMD Radeon RX 7800 XT 16GB",
      "price": "₩689,000",
      "specs": "3840 stream processors, 16GB GDDR6",
      "reason": "Excellent 1440p performance per won.",
      "link": "",
      "image": ""
    },
    "storage": {
      "name": "Samsung 990 EVO 1TB",
      "price": "₩119,000",
      "specs": "NVMe PCIe 4.0, up to 5000MB/s",
      "reason": "Fast load times with a good warranty.",
      "link": "",
      "image": ""
    },
    "psu": {
      "name": "Micronics Classic II 750W 80+ Gold",
      "price": "₩109,000",
      "specs": "ATX 3.0, fully modular",
      "reason": "Comfortable headroom for the GPU.",
      "link": "",
      "image": ""
    },
    "case": {
      "name": "darkFlash DLM22 Mesh",
      "price": "₩69,000",
      "specs": "mATX, mesh front, 4 fans",
      "reason": "Good airflow in a compact tower.",
      "link": "",
      "image": ""
    }
  },
  "total_price": "₩1,603,000",
  "total_reason": "Balanced for 1440p high settings; most of the budget goes to the GPU.",
  "suggestion": "If the budget is tight, drop to an RX 7700 XT and save about ₩120,000."
}"#;

const COMPATIBILITY_CHECK: &str = r#"{
  "components": {
    "cpu": "Intel Core i5-14400F",
    "motherboard": "ASUS PRIME B760M-A D4",
    "memory": "DDR5-5600 32GB",
    "gpu": "NVIDIA GeForce RTX 4070",
    "psu": "550W 80+ Bronze"
  },
  "checks": [
    {
      "items": ["Intel Core i5-14400F", "ASUS PRIME B760M-A D4"],
      "status": "ok",
      "reason": "LGA1700 socket matches; a BIOS update may be required on older boards."
    },
    {
      "items": ["ASUS PRIME B760M-A D4", "DDR5-5600 32GB"],
      "status": "incompatible",
      "reason": "The D4 board only accepts DDR4 memory."
    },
    {
      "items": ["NVIDIA GeForce RTX 4070", "550W 80+ Bronze"],
      "status": "warning",
      "reason": "550W meets the minimum but leaves little headroom; 650W is recommended."
    }
  ],
  "compatible": false,
  "summary": "Swap the motherboard for a DDR5 B760 model or use DDR4 memory."
}"#;

const SPEC_UPGRADE: &str = r#"{
  "upgrade_parts": [
    {
      "part_type": "gpu",
      "current": "NVIDIA GeForce GTX 1060 6GB",
      "name": "NVIDIA GeForce RTX 4060 Ti 8GB",
      "price": "₩529,000",
      "specs": "4352 CUDA cores, 8GB GDDR6",
      "reason": "Roughly 2.5x the frame rate at 1080p with DLSS support.",
      "link": "",
      "image": ""
    },
    {
      "part_type": "storage",
      "current": "1TB SATA HDD",
      "name": "WD Black SN770 1TB",
      "price": "₩99,000",
      "specs": "NVMe PCIe 4.0",
      "reason": "Removes the biggest source of load-time stutter.",
      "link": "",
      "image": ""
    }
  ],
  "total_price": "₩628,000",
  "summary": "Upgrade the GPU first; the SSD is the cheapest quality-of-life win."
}"#;

const BUILD_EVALUATION: &str = r#"{
  "performance": {
    "gaming": 84,
    "content_creation": 71,
    "office": 95,
    "streaming": 76
  },
  "price_performance": 81,
  "strengths": [
    "GPU is well matched to a 1440p monitor",
    "Plenty of RAM for multitasking"
  ],
  "weaknesses": [
    "CPU cooler is loud under sustained load",
    "Only one M.2 slot limits storage expansion"
  ],
  "summary": "A well balanced gaming build; a better cooler is the best next purchase."
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ResponseView, select_view};

    #[test]
    fn test_samples_render_as_their_mode() {
        let source = SampleSource;
        let cases = [
            (ChatMode::PartRecommendation, "part_recommendation"),
            (ChatMode::BuildRecommendation, "build"),
            (ChatMode::CompatibilityCheck, "compatibility"),
            (ChatMode::SpecUpgrade, "upgrade"),
            (ChatMode::BuildEvaluation, "evaluation"),
            (ChatMode::GeneralSearch, "markdown"),
        ];
        for (mode, kind) in cases {
            let reply = source.reply_for(&ModeRequest::new(mode, "quiet office PC", ExpertiseLevel::Beginner));
            assert_eq!(select_view(&reply, Some(mode)).kind(), kind, "{mode:?}");
        }
    }

    #[test]
    fn test_build_sample_total_matches_parts() {
        let reply = SampleSource.reply_for(&ModeRequest::new(
            ChatMode::BuildRecommendation,
            "",
            ExpertiseLevel::Beginner,
        ));
        let ResponseView::Build(payload) = select_view(&reply, None) else {
            panic!("build sample did not decode");
        };
        let estimate = payload.to_estimate("fallback", None).into_estimate(1, time::OffsetDateTime::UNIX_EPOCH);
        assert_eq!(estimate.parts_total(), 1_603_000);
    }

    #[test]
    fn test_general_search_mentions_prompt() {
        let reply = SampleSource.reply_for(&ModeRequest::new(
            ChatMode::GeneralSearch,
            "DDR5 vs DDR4",
            ExpertiseLevel::Expert,
        ));
        assert!(reply.contains("DDR5 vs DDR4"));
    }
}
