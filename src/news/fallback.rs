//! Built-in sample items served when no real data is available.

use chrono::{DateTime, TimeZone, Utc};

use crate::news::{Category, NewsItem};

struct FallbackEntry {
    id: &'static str,
    title: &'static str,
    summary: &'static str,
    published_at: (i32, u32, u32, u32, u32),
    source: &'static str,
    url: &'static str,
    tags: &'static [&'static str],
    category: Category,
}

const ENTRIES: [FallbackEntry; 6] = [
    FallbackEntry {
        id: "fallback-001",
        title: "OpenAI, GPT-5 개발 완료... 2025년 상반기 출시 예정",
        summary: "OpenAI가 차세대 언어모델 GPT-5의 개발을 완료했다고 발표했습니다. GPT-5는 기존 모델 대비 추론 능력과 멀티모달 처리 성능이 크게 향상되었습니다.",
        published_at: (2025, 8, 15, 9, 30),
        source: "TechCrunch",
        url: "https://techcrunch.com/ai-news",
        tags: &["OpenAI", "GPT-5", "언어모델"],
        category: Category::OpenAi,
    },
    FallbackEntry {
        id: "fallback-002",
        title: "구글, AI 칩 TPU v6 공개... 성능 3배 향상",
        summary: "구글이 새로운 AI 전용 칩 TPU v6를 공개했습니다. 이전 세대 대비 3배 향상된 성능으로 대규모 AI 모델 훈련 시간을 대폭 단축할 수 있습니다.",
        published_at: (2025, 8, 14, 14, 20),
        source: "Google AI",
        url: "https://ai.google/news",
        tags: &["Google", "TPU", "AI칩"],
        category: Category::Google,
    },
    FallbackEntry {
        id: "fallback-003",
        title: "메타, 라마 3.1 오픈소스 모델 출시",
        summary: "메타가 라마 3.1 오픈소스 언어모델을 출시했습니다. 4050억 개의 매개변수를 가진 이 모델은 상업적 이용이 가능한 최대 규모의 오픈소스 모델입니다.",
        published_at: (2025, 8, 13, 11, 15),
        source: "Meta AI",
        url: "https://ai.meta.com/news",
        tags: &["Meta", "Llama", "오픈소스"],
        category: Category::Meta,
    },
    FallbackEntry {
        id: "fallback-004",
        title: "AI 의료진단 정확도 95% 달성, 상용화 임박",
        summary: "국내 AI 스타트업이 개발한 의료 영상 진단 AI가 95%의 정확도를 달성하며 상용화를 앞두고 있습니다. 특히 폐암 조기 진단 분야에서 뛰어난 성과를 보이고 있습니다.",
        published_at: (2025, 8, 12, 16, 45),
        source: "의료AI뉴스",
        url: "https://medicalai.news",
        tags: &["의료AI", "진단", "폐암"],
        category: Category::Medical,
    },
    FallbackEntry {
        id: "fallback-005",
        title: "마이크로소프트, 코파일럿 AI 업데이트 발표",
        summary: "마이크로소프트가 코파일럿 AI의 대규모 업데이트를 발표했습니다. 새로운 버전은 코드 생성 속도가 40% 향상되었으며, 더 정확한 코드 제안을 제공합니다.",
        published_at: (2025, 8, 11, 13, 30),
        source: "Microsoft Blog",
        url: "https://blogs.microsoft.com/ai",
        tags: &["Microsoft", "Copilot", "코드생성"],
        category: Category::Microsoft,
    },
    FallbackEntry {
        id: "fallback-006",
        title: "엔비디아, H200 GPU로 AI 훈련 성능 혁신",
        summary: "엔비디아가 새로운 H200 GPU를 공개했습니다. 이전 세대 대비 2.5배 향상된 메모리 대역폭으로 대규모 AI 모델 훈련에서 획기적인 성능 개선을 보여줍니다.",
        published_at: (2025, 8, 10, 10, 0),
        source: "NVIDIA News",
        url: "https://nvidianews.nvidia.com",
        tags: &["NVIDIA", "H200", "GPU"],
        category: Category::Nvidia,
    },
];

fn timestamp((year, month, day, hour, minute): (i32, u32, u32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// The fixed fallback set, newest first.
pub fn fallback_items() -> Vec<NewsItem> {
    ENTRIES
        .iter()
        .map(|entry| NewsItem {
            id: entry.id.to_string(),
            title: entry.title.to_string(),
            summary: entry.summary.to_string(),
            published_at: timestamp(entry.published_at),
            source: entry.source.to_string(),
            url: entry.url.to_string(),
            image_url: None,
            tags: entry.tags.iter().map(|tag| tag.to_string()).collect(),
            category: entry.category,
        })
        .collect()
}
